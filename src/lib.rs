pub mod docx;
mod error;
pub mod model;
pub mod replace;
pub mod xml;

pub use docx::Document;
pub use error::Error;
pub use replace::replace_all;

use std::path::Path;
use std::time::Instant;

/// Opens `input`, replaces every occurrence of `search` and writes the result
/// to `output` (which may be `input` itself). Returns the replacement count.
pub fn replace_in_file(
    input: &Path,
    output: &Path,
    search: &str,
    replacement: &str,
) -> Result<usize, Error> {
    let t0 = Instant::now();

    let mut doc = Document::open(input)?;
    let t_parse = t0.elapsed();

    let count = replace_all(&mut doc, search, replacement);
    let t_replace = t0.elapsed();

    doc.save(output)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, replace={:.1}ms, write={:.1}ms, total={:.1}ms ({} replacement(s))",
        t_parse.as_secs_f64() * 1000.0,
        (t_replace - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_replace).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        count,
    );

    Ok(count)
}
