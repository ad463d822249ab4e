use crate::domain::{ParserResult, VERSION_ABSENT, VERSION_NOT_PARSEABLE};
use crate::parser::remarks::compile;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    Known {
        interpreted: String,
        version: Option<String>,
    },
    Unrecognized,
}

enum RuleSpec {
    /// Version is capture group 1; a literal `NULL` leaves it unset.
    Capture(&'static str),
    /// A match yields a fixed version label.
    Fixed(&'static str, &'static str),
}

struct RecognizerSpec {
    claim: &'static str,
    interpreted: &'static str,
    strip: Option<&'static str>,
    rules: &'static [RuleSpec],
}

const RECOGNIZERS: &[RecognizerSpec] = &[
    RecognizerSpec {
        claim: r"^[REFMAC]{6}",
        interpreted: "REFMAC",
        strip: None,
        rules: &[
            RuleSpec::Capture(r"^[REFMAC]{6} ?(?:V )?([.0-9A-Z]+)$"),
            RuleSpec::Fixed(r"^[REFMAC]{6}\s*$", VERSION_ABSENT),
        ],
    },
    RecognizerSpec {
        claim: r"^CNS",
        interpreted: "CNS",
        strip: None,
        rules: &[
            RuleSpec::Capture(r"^CNS \(([.0-9A-Z]+)\)$"),
            RuleSpec::Capture(r"^CNS(?:[ -])?(?:V. )?([.0-9A-Z]+)$"),
            RuleSpec::Fixed(r"^CNS\s*$", VERSION_ABSENT),
        ],
    },
    RecognizerSpec {
        claim: r"^TWIN_LSQ",
        interpreted: "CNS",
        strip: None,
        rules: &[RuleSpec::Fixed(r"^TWIN_LSQ$", "TWIN_LSQ")],
    },
    RecognizerSpec {
        claim: r"^CNX",
        interpreted: "CNX",
        strip: Some(r" ?\(ACCELRYS\)"),
        rules: &[
            RuleSpec::Capture(r"^CNX ?([.0-9\-]+)$"),
            RuleSpec::Fixed(r"^CNX\s*$", VERSION_ABSENT),
        ],
    },
    RecognizerSpec {
        claim: r"^X-?PLOR",
        interpreted: "X-PLOR",
        strip: Some(r" ?\(ONLINE\)"),
        rules: &[
            RuleSpec::Capture(r"^X-PLOR ([.0-9A-Z]+)\s*$"),
            RuleSpec::Fixed(r"^X-?PLOR\s*$", VERSION_ABSENT),
        ],
    },
    RecognizerSpec {
        claim: r"PHENIX.ENSEMBLE_REFINEMENT",
        interpreted: "PHENIX.ENSEMBLE_REFINEMENT",
        strip: None,
        rules: &[RuleSpec::Capture(
            r"^PHENIX \(PHENIX.ENSEMBLE_REFINEMENT: ([.\-_0-9A-Z]+)\)$",
        )],
    },
    RecognizerSpec {
        claim: r"^PHENIX",
        interpreted: "PHENIX.REFINE",
        strip: None,
        rules: &[
            RuleSpec::Capture(r"^PHENIX(?:.REFINE:)? ([.\-_0-9A-Z]+)$"),
            RuleSpec::Fixed(
                r"^PHENIX(?:.REFINE(?:MENT)?)?(?: \(PHENIX(.REFINE)?\))?$",
                VERSION_ABSENT,
            ),
            RuleSpec::Capture(r"^PHENIX \((?:PHENIX.REFINE: )?([.\-_0-9A-Z]+)\)$"),
        ],
    },
    RecognizerSpec {
        claim: r"BUSTER",
        interpreted: "BUSTER",
        strip: None,
        rules: &[
            RuleSpec::Capture(r"^(?:AUTO)?BUSTER(?:-TNT)? (?:BUSTER )?(?:V. )?([0-9.X]+)$"),
            RuleSpec::Fixed(r"^(?:AUTO)?BUSTER(?:[ \-/]TNT)?\s*$", VERSION_ABSENT),
        ],
    },
    RecognizerSpec {
        claim: r"^TNT",
        interpreted: "TNT",
        strip: None,
        rules: &[
            RuleSpec::Capture(r"^TNT (?:V. )?([\-.0-9A-Z]+(?: PRERELEASE)?)\s*$"),
            RuleSpec::Fixed(r"^TNT\s*$", VERSION_ABSENT),
        ],
    },
    RecognizerSpec {
        claim: r"^SHELX",
        interpreted: "SHELX",
        strip: None,
        rules: &[
            RuleSpec::Fixed(r"^SHELX\s*$", VERSION_ABSENT),
            RuleSpec::Capture(r"^SHELX[- ]?([HLS]?[\- ]?(?:[0-9\-]{2,4})?)$"),
        ],
    },
    RecognizerSpec {
        claim: r"^ARP/WARP",
        interpreted: "ARP/WARP",
        strip: None,
        rules: &[
            RuleSpec::Capture(r"^ARP/WARP V. ([.0-9]+)$"),
            RuleSpec::Fixed(r"^ARP/WARP$", VERSION_ABSENT),
        ],
    },
    RecognizerSpec {
        claim: r"^COOT",
        interpreted: "COOT",
        strip: None,
        rules: &[
            RuleSpec::Capture(r"^COOT ?(?:V. )?([0-9.\-]+(?:-PRE-[0-9]+)?)\s*$"),
            RuleSpec::Fixed(r"^COOT\s*$", VERSION_ABSENT),
        ],
    },
    RecognizerSpec {
        claim: r"^O",
        interpreted: "O",
        strip: None,
        rules: &[
            RuleSpec::Capture(r"^O([0-9.]+)\s*$"),
            RuleSpec::Fixed(r"^O\s*$", VERSION_ABSENT),
        ],
    },
    RecognizerSpec {
        claim: r"^PROFFT",
        interpreted: "PROLSQ",
        strip: None,
        rules: &[
            RuleSpec::Fixed(
                r"^PROFFT \(MODIFIED BY Z.OTWINOWSKI\)$",
                "PROFFT MODIFIED BY Z.OTWINOWSKI",
            ),
            RuleSpec::Fixed(r"^PROFFT$", "PROFFT"),
        ],
    },
    RecognizerSpec {
        claim: r"^PROLSQ",
        interpreted: "PROLSQ",
        strip: None,
        rules: &[
            RuleSpec::Fixed(
                r"^PROLSQ \(MODIFIED BY G.J.QUIGLEY\)$",
                "PROLSQ MODIFIED BY G.J.QUIGLEY",
            ),
            RuleSpec::Fixed(r"^PROLSQ$", "PROLSQ"),
        ],
    },
    RecognizerSpec {
        claim: r"^PROTIN",
        interpreted: "PROLSQ",
        strip: None,
        rules: &[RuleSpec::Fixed(r"^PROTIN$", "PROLSQ")],
    },
    RecognizerSpec {
        claim: r"^NUCLSQ",
        interpreted: "PROLSQ",
        strip: None,
        rules: &[
            RuleSpec::Fixed(
                r"^NUCLSQ \(MODIFIED BY G.J.QUIGLEY\)$",
                "NUCLSQ MODIFIED BY G.J.QUIGLEY",
            ),
            RuleSpec::Fixed(r"^NUCLSQ$", "NUCLSQ"),
        ],
    },
    RecognizerSpec {
        claim: r"^NUCLIN",
        interpreted: "PROLSQ",
        strip: None,
        rules: &[RuleSpec::Fixed(r"^NUCLIN$", "NUCLSQ")],
    },
    RecognizerSpec {
        claim: r"^GPRLSA",
        interpreted: "PROLSQ",
        strip: None,
        rules: &[RuleSpec::Fixed(r"^GPRLSA$", "GPRLSA")],
    },
    RecognizerSpec {
        claim: r"^DERIV",
        interpreted: "PROLSQ",
        strip: None,
        rules: &[RuleSpec::Fixed(r"^DERIV$", "DERIV")],
    },
    RecognizerSpec {
        claim: r"^CERIUS",
        interpreted: "CERIUS",
        strip: None,
        rules: &[
            RuleSpec::Capture(r"^CERIUS ?([0-9.\-]+)$"),
            RuleSpec::Fixed(r"^CERIUS$", VERSION_ABSENT),
        ],
    },
    RecognizerSpec {
        claim: r"^HKL-?3000",
        interpreted: "HKL-3000",
        strip: None,
        rules: &[RuleSpec::Fixed(r"^HKL-?3000$", VERSION_ABSENT)],
    },
    RecognizerSpec {
        claim: r"^GROMOS",
        interpreted: "GROMOS",
        strip: None,
        rules: &[
            RuleSpec::Capture(r"^GROMOS([0-9]+)$"),
            RuleSpec::Fixed(r"^GROMOS$", VERSION_ABSENT),
        ],
    },
];

/// Programs that are reported without a version.
pub const VERSIONLESS_PROGRAMS: &[&str] = &[
    "ARP",
    "BILDER",
    "CCP4",
    "CEDAR",
    "CHAIN",
    "CORELS",
    "DM",
    "DYNAMIX",
    "EREF",
    "FFX",
    "FMLS/VP",
    "FRODO",
    "HIPHOP",
    "IMPLOR",
    "LAFIRE",
    "LALS",
    "MAIN",
    "MOLPROBITY",
    "MOLLY",
    "MOPRO",
    "NCNS",
    "NCNS-TINKER",
    "NMREF",
    "PIKSOL",
    "PHASER",
    "PMB",
    "POLYVISION",
    "PRIMEX",
    "PRODRG",
    "PROTEIN",
    "QUANTA",
    "RESTRAIN",
    "SCWRL",
    "SHARP",
    "SFALL",
    "SOLVE",
    "SOLVE/RESOLVE",
    "TIBBITTS",
    "TOM",
    "TOM/FRODO",
    "XFIT",
    "XPLEO",
    "XTALVIEW",
];

enum VersionRule {
    Capture(Regex),
    Fixed(Regex, &'static str),
}

impl VersionRule {
    fn apply(&self, segment: &str) -> Option<Option<String>> {
        match self {
            Self::Capture(pattern) => {
                let captures = pattern.captures(segment)?;
                let version = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                Some((version != "NULL").then(|| version.to_string()))
            }
            Self::Fixed(pattern, version) => {
                pattern.is_match(segment).then(|| Some((*version).to_string()))
            }
        }
    }
}

struct Recognizer {
    claim: Regex,
    interpreted: &'static str,
    strip: Option<Regex>,
    rules: Vec<VersionRule>,
}

impl Recognizer {
    fn compile(spec: &RecognizerSpec) -> ParserResult<Self> {
        let rules = spec
            .rules
            .iter()
            .map(|rule| match rule {
                RuleSpec::Capture(pattern) => compile(pattern).map(VersionRule::Capture),
                RuleSpec::Fixed(pattern, version) => {
                    compile(pattern).map(|regex| VersionRule::Fixed(regex, *version))
                }
            })
            .collect::<ParserResult<Vec<_>>>()?;
        Ok(Self {
            claim: compile(spec.claim)?,
            interpreted: spec.interpreted,
            strip: spec.strip.map(compile).transpose()?,
            rules,
        })
    }

    fn extract(&self, segment: &str) -> Option<String> {
        let cleaned = match &self.strip {
            Some(strip) => strip.replace_all(segment, ""),
            None => segment.into(),
        };
        self.rules
            .iter()
            .find_map(|rule| rule.apply(&cleaned))
            .unwrap_or_else(|| Some(VERSION_NOT_PARSEABLE.to_string()))
    }
}

/// Ordered recognizers; the first whose claim matches interprets the segment.
pub struct RecognizerRegistry {
    recognizers: Vec<Recognizer>,
}

impl std::fmt::Debug for RecognizerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerRegistry")
            .field("recognizers", &self.recognizers.len())
            .finish()
    }
}

impl RecognizerRegistry {
    pub fn new() -> ParserResult<Self> {
        let recognizers = RECOGNIZERS
            .iter()
            .map(Recognizer::compile)
            .collect::<ParserResult<Vec<_>>>()?;
        Ok(Self { recognizers })
    }

    pub fn recognize(&self, segment: &str) -> Recognition {
        if let Some(recognizer) = self
            .recognizers
            .iter()
            .find(|recognizer| recognizer.claim.is_match(segment))
        {
            return Recognition::Known {
                interpreted: recognizer.interpreted.to_string(),
                version: recognizer.extract(segment),
            };
        }
        recognize_versionless(segment)
    }
}

fn recognize_versionless(segment: &str) -> Recognition {
    VERSIONLESS_PROGRAMS
        .iter()
        .filter(|name| {
            segment
                .strip_prefix(**name)
                .is_some_and(|rest| !rest.starts_with("ED"))
        })
        .last()
        .map_or(Recognition::Unrecognized, |name| {
            let version = if segment == *name {
                VERSION_ABSENT
            } else {
                VERSION_NOT_PARSEABLE
            };
            Recognition::Known {
                interpreted: (*name).to_string(),
                version: Some(version.to_string()),
            }
        })
}
