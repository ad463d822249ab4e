use crate::domain::ProgramMention;

type MentionRow = (&'static str, &'static str, &'static str);

/// Whole-field values that the generic splitter would misread.
const EXCEPTIONAL_FIELDS: &[(&str, &[MentionRow])] = &[
    ("X-PLOR 3.1 AND 3.85", &[("X-PLOR 3.85", "X-PLOR", "3.85")]),
    ("X-PLOR 3.1, 3.816", &[("X-PLOR 3.816", "X-PLOR", "3.816")]),
    ("CNS 1.1 & 1.3", &[("CNS 1.3", "CNS", "1.3")]),
    (
        "CNS 0.4, O, OOPS",
        &[("CNS 0.4", "CNS", "0.4"), ("O", "O", "-"), ("OOPS", "OOPS", "-")],
    ),
    ("CNS 0.1-0.4", &[("CNS 0.4", "CNS", "0.4")]),
    ("CNS 0.9,1.0,1.1", &[("CNS 1.1", "CNS", "1.1")]),
    ("CNS 1.3 WITH DEN REFINEMENT", &[("CNS 1.3", "CNS", "1.3")]),
    ("CNS 1.2 (USING XTAL_TWIN UTILITIES)", &[("CNS 1.2", "CNS", "1.2")]),
    (
        "PHENIX.REFINE_REFMAC 5.5.0070",
        &[
            ("PHENIX.REFINE", "PHENIX.REFINE", "-"),
            ("REFMAC 5.5.0070", "REFMAC", "5.5.0070"),
        ],
    ),
    (
        "PHENIX (CCI APPS 2007_04_06_1210)",
        &[(
            "PHENIX (PHENIX.REFINE: 2007_04_06_1210)",
            "PHENIX.REFINE",
            "2007_04_06_1210",
        )],
    ),
    (
        "PHENIX VERSION 1.8_1069 (PHENIX.REFINE)",
        &[("PHENIX (PHENIX.REFINE: 1.8_1069)", "PHENIX.REFINE", "1.8_1069")],
    ),
    (
        "PHENIX 1.6.2_432 - REFINE",
        &[("PHENIX (PHENIX.REFINE: 1.6.2_432)", "PHENIX.REFINE", "1.6.2_432")],
    ),
    ("PHENIX REFINE", &[("PHENIX.REFINE", "PHENIX.REFINE", "-")]),
    ("PHENIX, REFINE", &[("PHENIX.REFINE", "PHENIX.REFINE", "-")]),
    ("PHENIX AUTOREFINE", &[("PHENIX.REFINE", "PHENIX.REFINE", "-")]),
    ("REFMAC 5.1.24/TLS", &[("REFMAC 5.1.24", "REFMAC", "5.1.24")]),
    ("REFMAC 5.2.0005 24/04/2001", &[("REFMAC 5.2.0005", "REFMAC", "5.2.0005")]),
    ("REFMAC 5.2.0019 24/04/2001", &[("REFMAC 5.2.0019", "REFMAC", "5.2.0019")]),
    (
        "REFMAC X-PLOR 3.843",
        &[("REFMAC", "REFMAC", "-"), ("X-PLOR 3.843", "X-PLOR", "3.843")],
    ),
    ("REFMAC5 5.2.0019", &[("REFMAC 5.2.0019", "REFMAC", "5.2.0019")]),
    (
        "REFMAC 5.5.0109 (AND PHENIX)",
        &[
            ("REFMAC 5.5.0109", "REFMAC", "5.5.0109"),
            ("PHENIX.REFINE", "PHENIX.REFINE", "-"),
        ],
    ),
    ("BUSTER, BETA VERSION", &[("BUSTER BETA", "BUSTER", "BETA")]),
    (
        "TNT BUSTER/TNT",
        &[("TNT", "TNT", "-"), ("BUSTER/TNT", "BUSTER", "-")],
    ),
    ("O, VERSION 9.0.7", &[("O 9.0.7", "O", "9.0.7")]),
];

pub(super) fn lookup(field: &str) -> Option<Vec<ProgramMention>> {
    EXCEPTIONAL_FIELDS
        .iter()
        .find(|(exceptional, _)| *exceptional == field)
        .map(|(_, rows)| {
            rows.iter()
                .map(|(raw, interpreted, version)| {
                    ProgramMention::new(*raw, *interpreted, Some(*version))
                })
                .collect()
        })
}
