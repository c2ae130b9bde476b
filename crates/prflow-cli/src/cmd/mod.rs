pub mod branch;
pub mod commit;
pub mod config;
pub mod name;
pub mod plan;
pub mod pr;

use std::io::IsTerminal;

/// Let the user pick one of `options`. Without a terminal, or with
/// `assume_first`, the first option is taken. `None` when the user cancels.
pub fn choose(prompt: &str, options: Vec<String>, assume_first: bool) -> anyhow::Result<Option<String>> {
    if options.is_empty() {
        return Ok(None);
    }
    if assume_first || !std::io::stdin().is_terminal() {
        return Ok(options.into_iter().next());
    }
    match inquire::Select::new(prompt, options).prompt() {
        Ok(choice) => Ok(Some(choice)),
        Err(inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted) => {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
