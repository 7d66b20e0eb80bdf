// Compression: joins the satellite tables into one document per applicant,
// and fans that document back out again.
// Compress must run before decompress, shortlisting, or LLM evaluation.

pub mod compress;
pub mod decompress;
