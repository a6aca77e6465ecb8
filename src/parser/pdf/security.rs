use crate::error::ParseError;
use lopdf::encryption::DecryptionError;
use std::path::Path;

/// Open an encrypted PDF for reading.
///
/// Documents that only carry an owner password decrypt with the empty user
/// password and need no credential. Otherwise the supplied password decides
/// between success, `PasswordRequired` and `InvalidPassword`. Encryption
/// schemes lopdf cannot decrypt fail as `ExtractionFailed` whatever the
/// password, since retrying with other credentials cannot help.
pub fn unlock(
    pdf: &mut lopdf::Document,
    path: &Path,
    password: Option<&str>,
) -> Result<(), ParseError> {
    if !pdf.is_encrypted() {
        return Ok(());
    }

    resolve_password(path, password, |candidate| attempt(pdf, path, candidate))
}

/// Whether opening the document requires a user password.
///
/// Decrypts in place when the empty user password is accepted.
pub fn needs_password(pdf: &mut lopdf::Document, path: &Path) -> Result<bool, ParseError> {
    if !pdf.is_encrypted() {
        return Ok(false);
    }
    attempt(pdf, path, "").map(|unlocked| !unlocked)
}

/// `Ok(false)` only for a rejected password; any other decryption failure is an error.
fn attempt(pdf: &mut lopdf::Document, path: &Path, candidate: &str) -> Result<bool, ParseError> {
    match pdf.decrypt(candidate) {
        Ok(()) => Ok(true),
        Err(lopdf::Error::Decryption(DecryptionError::IncorrectPassword)) => Ok(false),
        Err(error) => Err(ParseError::extraction_with(
            path,
            "unsupported encryption",
            error,
        )),
    }
}

pub(crate) fn resolve_password<F>(
    path: &Path,
    password: Option<&str>,
    mut authenticate: F,
) -> Result<(), ParseError>
where
    F: FnMut(&str) -> Result<bool, ParseError>,
{
    if authenticate("")? {
        return Ok(());
    }

    match password {
        None => Err(ParseError::PasswordRequired {
            path: path.to_path_buf(),
        }),
        Some(candidate) if authenticate(candidate)? => Ok(()),
        Some(_) => Err(ParseError::InvalidPassword {
            path: path.to_path_buf(),
        }),
    }
}
