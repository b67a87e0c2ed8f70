//! # Background Tasks Module
//!
//! I quattro task concreti, ognuno in un sottomodulo:
//! - `thumbnail`: genera una thumbnail da una command line shell già costruita
//! - `subtitle_fix`: toglie il flag "default" dalla prima traccia sottotitoli
//! - `subtitle_extract`: estrae una traccia sottotitoli in un file `.srt` accanto all'output
//! - `hdr10`: estrae i metadata HDR10+ con la pipeline ffmpeg → hdr10plus_parser
//!
//! Ogni task costruisce il proprio comando, lo esegue con `ProcessRunner` o
//! `PipelineRunner` e restituisce un solo `TaskResult`. I fallimenti dei tool
//! diventano messaggi di log, mai errori che escono dal worker.

pub mod hdr10;
pub mod subtitle_extract;
pub mod subtitle_fix;
pub mod thumbnail;

pub use hdr10::Hdr10ExtractTask;
pub use subtitle_extract::SubtitleExtractTask;
pub use subtitle_fix::SubtitleFixTask;
pub use thumbnail::ThumbnailTask;
