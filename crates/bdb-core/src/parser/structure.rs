use super::columns;
use crate::domain::{BdbError, ParserResult};
use std::str::FromStr;
use tracing::debug;

const ANISOU_SCALE: f64 = 1.0e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidueKind {
    Standard,
    Hetero,
    Water,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub name: String,
    pub altloc: Option<char>,
    pub occupancy: f64,
    pub b_factor: f64,
    /// U11, U22, U33, U12, U13, U23 in Å².
    pub anisou: Option<[f64; 6]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub name: String,
    pub seq: i32,
    pub icode: Option<char>,
    pub kind: ResidueKind,
    pub atoms: Vec<Atom>,
}

impl Residue {
    pub fn is_standard(&self) -> bool {
        self.kind == ResidueKind::Standard
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atoms.iter().any(|atom| atom.name == name)
    }

    fn matches(&self, kind: ResidueKind, seq: i32, icode: Option<char>) -> bool {
        self.kind == kind && self.seq == seq && self.icode == icode
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: String,
    pub residues: Vec<Residue>,
}

impl Chain {
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.residues.iter().flat_map(|residue| residue.atoms.iter())
    }

    pub fn standard_residues(&self) -> impl Iterator<Item = &Residue> {
        self.residues.iter().filter(|residue| residue.is_standard())
    }
}

/// Chains, residues and atoms of the first model of a PDB file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    pub chains: Vec<Chain>,
}

impl Structure {
    pub fn from_source(source: &str) -> ParserResult<Self> {
        let mut builder = StructureBuilder::default();
        let mut seen_model = false;
        for (index, line) in source.lines().enumerate() {
            let record = columns(line, 0, 6).trim_end();
            match record {
                "MODEL" if seen_model => break,
                "MODEL" => seen_model = true,
                "ENDMDL" => break,
                "ATOM" | "HETATM" => builder.push_atom(line, index + 1, record == "HETATM")?,
                "ANISOU" => builder.push_anisou(line, index + 1)?,
                _ => {}
            }
        }
        let structure = builder.finish();
        debug!(
            "Read {} chains with {} atoms",
            structure.chains.len(),
            structure.atoms().count()
        );
        Ok(structure)
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.chains.iter().flat_map(Chain::atoms)
    }

    pub fn chain(&self, id: &str) -> Option<&Chain> {
        self.chains.iter().find(|chain| chain.id == id)
    }

    /// Looks up a standard residue by chain, sequence number and insertion code.
    pub fn find_residue(&self, chain_id: &str, seq: i32, icode: Option<char>) -> Option<&Residue> {
        self.chain(chain_id)?
            .residues
            .iter()
            .find(|residue| residue.matches(ResidueKind::Standard, seq, icode))
    }
}

#[derive(Debug, Default)]
struct StructureBuilder {
    chains: Vec<Chain>,
    last_atom: Option<(usize, usize, usize)>,
}

impl StructureBuilder {
    fn push_atom(&mut self, line: &str, line_number: usize, hetero: bool) -> ParserResult<()> {
        let name = columns(line, 12, 16).trim().to_string();
        let altloc = single_char(columns(line, 16, 17));
        let residue_name = columns(line, 17, 20).trim().to_string();
        let chain_id = columns(line, 21, 22).to_string();
        let seq = parse_column::<i32>(line, 22, 26, line_number, "residue number")?
            .unwrap_or_default();
        let icode = single_char(columns(line, 26, 27));
        let occupancy =
            parse_column::<f64>(line, 54, 60, line_number, "occupancy")?.unwrap_or(1.0);
        let b_factor =
            parse_column::<f64>(line, 60, 66, line_number, "temperature factor")?.unwrap_or(0.0);

        let kind = if matches!(residue_name.as_str(), "HOH" | "WAT") {
            ResidueKind::Water
        } else if hetero {
            ResidueKind::Hetero
        } else {
            ResidueKind::Standard
        };

        let chain_index = match self.chains.iter().position(|chain| chain.id == chain_id) {
            Some(index) => index,
            None => {
                self.chains.push(Chain {
                    id: chain_id,
                    residues: Vec::new(),
                });
                self.chains.len() - 1
            }
        };
        let residues = &mut self.chains[chain_index].residues;
        let residue_index = match residues
            .iter()
            .rposition(|residue| residue.matches(kind, seq, icode))
        {
            Some(index) => index,
            None => {
                residues.push(Residue {
                    name: residue_name,
                    seq,
                    icode,
                    kind,
                    atoms: Vec::new(),
                });
                residues.len() - 1
            }
        };

        let atom = Atom {
            name,
            altloc,
            occupancy,
            b_factor,
            anisou: None,
        };
        let atoms = &mut residues[residue_index].atoms;
        self.last_atom = match atoms.iter().position(|existing| existing.name == atom.name) {
            Some(index) if atom.altloc.is_some() && atom.occupancy > atoms[index].occupancy => {
                atoms[index] = atom;
                Some((chain_index, residue_index, index))
            }
            Some(_) => None,
            None => {
                atoms.push(atom);
                Some((chain_index, residue_index, atoms.len() - 1))
            }
        };
        Ok(())
    }

    fn push_anisou(&mut self, line: &str, line_number: usize) -> ParserResult<()> {
        let Some((chain, residue, atom)) = self.last_atom else {
            return Ok(());
        };
        let mut tensor = [0.0; 6];
        for (slot, start) in tensor.iter_mut().zip((28..70).step_by(7)) {
            let value = parse_column::<i64>(line, start, start + 7, line_number, "ANISOU value")?
                .ok_or_else(|| malformed(line_number, "ANISOU value", ""))?;
            *slot = value as f64 * ANISOU_SCALE;
        }
        self.chains[chain].residues[residue].atoms[atom].anisou = Some(tensor);
        Ok(())
    }

    fn finish(self) -> Structure {
        Structure {
            chains: self.chains,
        }
    }
}

fn single_char(field: &str) -> Option<char> {
    field.chars().next().filter(|c| !c.is_whitespace())
}

fn parse_column<T: FromStr>(
    line: &str,
    start: usize,
    end: usize,
    line_number: usize,
    field: &str,
) -> ParserResult<Option<T>> {
    let text = columns(line, start, end).trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<T>()
        .map(Some)
        .map_err(|_| malformed(line_number, field, text))
}

fn malformed(line_number: usize, field: &str, text: &str) -> BdbError {
    BdbError::input_validation(
        "INPUT.STRUCTURE_RECORD",
        format!("line {}: malformed {} '{}'", line_number, field, text),
    )
}

#[cfg(test)]
mod tests {
    use super::{ResidueKind, Structure};
    use crate::domain::BdbErrorCategory;

    const COORDINATES: &str = "\
ATOM      1  N   MET A   1      11.104  13.207   2.100  1.00 20.00           N
ANISOU    1  N   MET A   1     2406   1892   1614    198    519   -328       N
ATOM      2  CA AMET A   1      12.560  13.207   2.100  0.40 21.00           C
ATOM      3  CA BMET A   1      12.570  13.207   2.100  0.60 22.00           C
ANISOU    3  CA BMET A   1     2500   2500   2500      0      0      0       C
HETATM    4  O   HOH A 101      10.000  10.000  10.000  1.00 30.00           O
HETATM    5 ZN    ZN B 201      10.000  10.000  10.000  1.00 40.00          ZN
ENDMDL
ATOM      6  N   GLY A   2      11.104  13.207   2.100  1.00 20.00           N
";

    #[test]
    fn first_model_atoms_are_grouped_by_chain_and_residue() {
        let structure = Structure::from_source(COORDINATES).expect("coordinates should parse");

        assert_eq!(structure.chains.len(), 2);
        let chain_a = structure.chain("A").expect("chain A should exist");
        assert_eq!(chain_a.residues.len(), 2);
        assert_eq!(chain_a.residues[0].kind, ResidueKind::Standard);
        assert_eq!(chain_a.residues[1].kind, ResidueKind::Water);
        assert_eq!(
            structure.chain("B").expect("chain B should exist").residues[0].kind,
            ResidueKind::Hetero
        );
        assert!(structure.find_residue("A", 2, None).is_none());
        assert!(structure.find_residue("A", 1, None).is_some());
    }

    #[test]
    fn highest_occupancy_altloc_is_kept_with_its_anisou() {
        let structure = Structure::from_source(COORDINATES).expect("coordinates should parse");
        let residue = &structure.chains[0].residues[0];

        assert_eq!(residue.atoms.len(), 2);
        let calpha = &residue.atoms[1];
        assert_eq!(calpha.altloc, Some('B'));
        assert_eq!(calpha.b_factor, 22.0);
        let tensor = calpha.anisou.expect("B conformer should carry ANISOU");
        assert!((tensor[0] - 0.25).abs() < 1e-12);

        let nitrogen = residue.atoms[0].anisou.expect("N should carry ANISOU");
        assert!((nitrogen[5] + 0.0328).abs() < 1e-12);
    }

    #[test]
    fn malformed_numeric_column_is_an_input_error() {
        let source =
            "ATOM      1  N   MET A   1      11.104  13.207   2.100  1.00 2X.00           N\n";
        let error = Structure::from_source(source).expect_err("bad B-factor should fail");
        assert_eq!(error.category(), BdbErrorCategory::InputValidationError);
        assert_eq!(error.code(), "INPUT.STRUCTURE_RECORD");
    }
}
