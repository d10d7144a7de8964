use super::{Action, account, session};
use anyhow::Result;

pub(super) async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Session(args) => session::execute(args).await,
        Action::Account(args) => account::execute(args).await,
    }
}
