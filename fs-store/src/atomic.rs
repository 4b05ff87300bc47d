use std::fs;
use std::path::Path;

use data_error::Result;

/// Write `data` to a temporary file next to `dest` and rename it into
/// place, so a reader never observes a half-written file.
pub fn write_atomic(dest: &Path, data: &[u8]) -> Result<()> {
    let mut tmp = dest.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    fs::write(tmp, data)?;
    fs::rename(tmp, dest)?;

    Ok(())
}
