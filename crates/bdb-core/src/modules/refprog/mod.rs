mod exceptions;
mod recognizers;
mod split;

pub use recognizers::{Recognition, RecognizerRegistry, VERSIONLESS_PROGRAMS};

use crate::domain::{
    OTHER_PROGRAM, ParserResult, ProgramMention, VERSION_ABSENT, VERSION_NOT_PARSEABLE,
};
use split::SegmentSplitter;
use tracing::{debug, warn};

const UNREPORTED_FIELDS: &[&str] = &["NULL", "NONE", "NO REFINEMENT"];

/// Turns a free-text "refinement program" field into program mentions.
#[derive(Debug)]
pub struct TextNormalizer {
    splitter: SegmentSplitter,
    registry: RecognizerRegistry,
}

impl TextNormalizer {
    pub fn new() -> ParserResult<Self> {
        Ok(Self {
            splitter: SegmentSplitter::new()?,
            registry: RecognizerRegistry::new()?,
        })
    }

    pub fn normalize(&self, field: &str) -> Vec<ProgramMention> {
        let field = field.trim().to_uppercase();

        if UNREPORTED_FIELDS.contains(&field.as_str()) {
            warn_exceptional_field();
            return vec![ProgramMention::unreported()];
        }
        if let Some(mentions) = exceptions::lookup(&field) {
            warn_exceptional_field();
            return mentions;
        }

        self.splitter
            .split(&field)
            .into_iter()
            .map(|segment| self.interpret(segment))
            .collect()
    }

    fn interpret(&self, segment: String) -> ProgramMention {
        let mention = match self.registry.recognize(&segment) {
            Recognition::Known {
                interpreted,
                version,
            } => ProgramMention {
                raw: Some(segment),
                interpreted: Some(interpreted),
                version,
            },
            Recognition::Unrecognized => {
                ProgramMention::new(segment, OTHER_PROGRAM, Some(VERSION_NOT_PARSEABLE))
            }
        };
        report(&mention);
        mention
    }
}

fn warn_exceptional_field() {
    warn!("Pre-defined exceptional refinement program case found.");
}

fn report(mention: &ProgramMention) {
    let interpreted = mention.interpreted.as_deref().unwrap_or_default();
    if mention.is_other() {
        warn!(
            "{}: program {} could not (yet) be parsed.",
            interpreted,
            mention.raw.as_deref().unwrap_or_default()
        );
    } else if mention.version.as_deref() == Some(VERSION_NOT_PARSEABLE) {
        warn!("{}: version could not (yet) be parsed.", interpreted);
    } else if mention.version.as_deref() == Some(VERSION_ABSENT) {
        debug!("{}: version not present.", interpreted);
    }
}

#[cfg(test)]
mod tests {
    use super::TextNormalizer;
    use crate::domain::ProgramMention;

    fn normalize(field: &str) -> Vec<ProgramMention> {
        TextNormalizer::new()
            .expect("normalizer should build")
            .normalize(field)
    }

    fn mention(raw: &str, interpreted: &str, version: &str) -> ProgramMention {
        ProgramMention::new(raw, interpreted, Some(version))
    }

    #[test]
    fn unreported_fields_yield_a_single_empty_mention() {
        for field in ["NULL", "NONE", "NO REFINEMENT", "  none  "] {
            assert_eq!(normalize(field), vec![ProgramMention::unreported()], "field {field}");
        }
    }

    #[test]
    fn exceptional_fields_bypass_the_splitter() {
        assert_eq!(normalize("CNS 1.1 & 1.3"), vec![mention("CNS 1.3", "CNS", "1.3")]);
        assert_eq!(
            normalize("REFMAC 5.5.0109 (AND PHENIX)"),
            vec![
                mention("REFMAC 5.5.0109", "REFMAC", "5.5.0109"),
                mention("PHENIX.REFINE", "PHENIX.REFINE", "-"),
            ]
        );
        assert_eq!(
            normalize("TNT BUSTER/TNT"),
            vec![mention("TNT", "TNT", "-"), mention("BUSTER/TNT", "BUSTER", "-")]
        );
        assert_eq!(normalize("O, VERSION 9.0.7"), vec![mention("O 9.0.7", "O", "9.0.7")]);
    }

    #[test]
    fn split_fields_keep_segment_order() {
        assert_eq!(
            normalize("/REFMAC5.7/////COOT//"),
            vec![
                mention("REFMAC5.7", "REFMAC", "5.7"),
                mention("COOT", "COOT", "-"),
            ]
        );
        assert_eq!(
            normalize("TNT AND BUSTER,"),
            vec![mention("TNT", "TNT", "-"), mention("BUSTER", "BUSTER", "-")]
        );
    }

    #[test]
    fn lowercase_and_padded_fields_are_normalized() {
        assert_eq!(normalize("refamc"), vec![mention("REFAMC", "REFMAC", "-")]);
        assert_eq!(normalize("REFMAC 5.8                  "), vec![mention("REFMAC 5.8", "REFMAC", "5.8")]);
        assert_eq!(
            normalize("PHENIX (PHENIX.REFINE: DEV_1549+SVN)      "),
            vec![mention("PHENIX (PHENIX.REFINE: DEV_1549+SVN)", "PHENIX.REFINE", "np")]
        );
    }

    #[test]
    fn unrecognized_segments_are_other() {
        assert_eq!(
            normalize("SIMULATED ANNEALING METHOD"),
            vec![mention("SIMULATED ANNEALING METHOD", "OTHER", "np")]
        );
        assert_eq!(normalize("WARP/ARP"), vec![mention("WARP/ARP", "OTHER", "np")]);
    }
}
