//! Prompting technique catalog and inference

mod inference;
mod registry;

pub use inference::{Inference, infer, infer_technique};
pub use registry::{
    FALLBACK_TECHNIQUE_ID, SectionDef, TECHNIQUES, Technique, all_techniques, fallback_technique, get_technique,
    resolve_technique,
};
