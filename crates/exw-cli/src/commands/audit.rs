use anyhow::{bail, Result};
use exw_audit::{verify_hash_chain, VerifyResult};

/// `exw audit verify`: exit non-zero when the chain is broken.
pub fn verify(path: &str) -> Result<()> {
    match verify_hash_chain(path)? {
        VerifyResult::Valid { lines } => {
            println!("audit_chain=VALID lines={}", lines);
            Ok(())
        }
        VerifyResult::Broken { line, reason } => {
            println!("audit_chain=BROKEN line={}", line);
            bail!("audit chain broken at line {}: {}", line, reason)
        }
    }
}
