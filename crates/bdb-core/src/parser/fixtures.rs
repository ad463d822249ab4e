//! Fixed-width PDB lines for unit tests.

pub(crate) fn atom_line(
    serial: usize,
    name: &str,
    residue: &str,
    chain: char,
    seq: i32,
    occupancy: f64,
    b_factor: f64,
) -> String {
    format!(
        "ATOM  {:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}",
        serial, name, residue, chain, seq, 0.0, 0.0, 0.0, occupancy, b_factor
    )
}

pub(crate) fn anisou_line(
    serial: usize,
    name: &str,
    residue: &str,
    chain: char,
    seq: i32,
    tensor: [i64; 6],
) -> String {
    format!(
        "ANISOU{:>5} {:<4} {:>3} {}{:>4}  {:>7}{:>7}{:>7}{:>7}{:>7}{:>7}",
        serial, name, residue, chain, seq, tensor[0], tensor[1], tensor[2], tensor[3], tensor[4],
        tensor[5]
    )
}

/// Residue with the given atom names, every atom carrying `b_factors[i]`
/// (the last value repeats when fewer are given).
pub(crate) fn residue_lines(
    serial: &mut usize,
    residue: &str,
    chain: char,
    seq: i32,
    names: &[&str],
    b_factors: &[f64],
) -> Vec<String> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            *serial += 1;
            let b_factor = b_factors
                .get(index)
                .or(b_factors.last())
                .copied()
                .unwrap_or(20.0);
            atom_line(*serial, name, residue, chain, seq, 1.0, b_factor)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{anisou_line, atom_line};
    use crate::parser::columns;

    #[test]
    fn generated_lines_follow_pdb_columns() {
        let atom = atom_line(7, "CA", "ALA", 'B', 12, 0.5, 33.25);
        assert_eq!(columns(&atom, 0, 6), "ATOM  ");
        assert_eq!(columns(&atom, 12, 16).trim(), "CA");
        assert_eq!(columns(&atom, 17, 20), "ALA");
        assert_eq!(columns(&atom, 21, 22), "B");
        assert_eq!(columns(&atom, 22, 26).trim(), "12");
        assert_eq!(columns(&atom, 54, 60).trim(), "0.50");
        assert_eq!(columns(&atom, 60, 66).trim(), "33.25");

        let anisou = anisou_line(7, "CA", "ALA", 'B', 12, [1, 2, 3, 4, 5, -6]);
        assert_eq!(columns(&anisou, 28, 35).trim(), "1");
        assert_eq!(columns(&anisou, 63, 70).trim(), "-6");
    }
}
