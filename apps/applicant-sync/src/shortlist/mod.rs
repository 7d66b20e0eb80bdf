// Rule-based shortlisting over the compressed applicant document.
// `criteria` is pure and deterministic; `automation` is the batch job that
// reads documents and writes status and lead records.

pub mod automation;
pub mod criteria;
pub mod dates;
