use anyhow::Result;
use recur_core::codec::encode;
use recur_core::error::CoreError;
use recur_core::models::RecurrenceRule;
use tracing::debug;

use crate::cli::EncodeCommand;

pub fn encode_rule(command: EncodeCommand) -> Result<()> {
    let rule = RecurrenceRule::from_attributes(command.attributes());
    debug!(?rule, "built rule from command line");

    let violations = rule.validate();
    if !violations.is_empty() {
        return Err(CoreError::InvalidRule(violations).into());
    }

    println!("{}", encode(&rule.applicable()));
    Ok(())
}
