//! Administrative command implementations

use anyhow::{bail, Result};

use lounge_level::{ActivityLedger, LevelStore};

/// Override a user's exp without touching their stats
pub fn set_exp_command<S: LevelStore>(ledger: &ActivityLedger<S>, user_id: u64, exp: u64) -> Result<()> {
    let record = ledger.set_exp_directly(user_id, exp)?;
    println!(
        "User {} set to {} exp (level {})",
        user_id, record.current_exp, record.level
    );
    Ok(())
}

/// Reset every record. Requires explicit confirmation.
pub fn reset_all_command<S: LevelStore>(ledger: &ActivityLedger<S>, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("This clears every level record and cannot be undone.\nRe-run with --yes to confirm.");
    }

    let count = ledger.reset_all()?;
    println!("Reset {} level records.", count);
    Ok(())
}
