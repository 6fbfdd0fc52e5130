use {
    anyhow::Result,
    clap::Subcommand,
    teamsync_store::{BridgeStore, UserIdentity},
};

#[derive(Subcommand)]
pub enum UserAction {
    /// Show the remote identity and token state of a local user.
    Show {
        /// Local user id.
        user_id: String,
    },
    /// Print the local user id for a remote user.
    Remote { remote_user_id: String },
    /// Map a local user to a remote user.
    Set {
        /// Local user id.
        user_id: String,
        remote_user_id: String,
        /// Carry over the stored token instead of clearing it.
        #[arg(long)]
        keep_token: bool,
    },
}

pub async fn handle_users(store: &dyn BridgeStore, action: UserAction) -> Result<()> {
    match action {
        UserAction::Show { user_id } => {
            match store.identity(&user_id).await? {
                Some(identity) => print_identity(&identity),
                None => println!("No identity for {user_id}."),
            }
            Ok(())
        },
        UserAction::Remote { remote_user_id } => {
            match store.remote_to_local_user(&remote_user_id).await? {
                Some(local) => println!("{local}"),
                None => println!("No local user for {remote_user_id}."),
            }
            Ok(())
        },
        UserAction::Set {
            user_id,
            remote_user_id,
            keep_token,
        } => {
            // The upsert replaces the token too, so re-send the old one to keep it.
            let token = if keep_token {
                store.token_for_local_user(&user_id).await?
            } else {
                None
            };
            store
                .upsert_identity(&user_id, &remote_user_id, token.as_ref())
                .await?;
            let token_state = if token.is_some() {
                "kept"
            } else {
                "cleared"
            };
            println!("Mapped {user_id} to {remote_user_id} (token {token_state}).");
            Ok(())
        },
    }
}

fn print_identity(identity: &UserIdentity) {
    println!("local:  {}", identity.local_user_id);
    println!("remote: {}", identity.remote_user_id);
    match &identity.token {
        None => println!("token:  none"),
        Some(token) => match token.expiry {
            Some(expiry) => println!("token:  present (expires {})", expiry.to_rfc3339()),
            None => println!("token:  present (no expiry)"),
        },
    }
}
