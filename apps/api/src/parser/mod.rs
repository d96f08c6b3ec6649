// Response parsing: structured data out of unstructured model text.
// Pure functions only; failures degrade to empty results and are logged.

pub mod classification;
pub mod json;
