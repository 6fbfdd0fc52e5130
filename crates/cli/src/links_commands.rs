use {
    anyhow::Result,
    clap::Subcommand,
    teamsync_store::{BridgeStore, ChannelLink},
};

#[derive(Subcommand)]
pub enum LinkAction {
    /// Show the link for a local channel.
    Show {
        /// Local channel id.
        channel_id: String,
    },
    /// Find the link for a remote team and channel.
    Find {
        remote_team_id: String,
        remote_channel_id: String,
    },
    /// Link a local channel to a remote channel.
    Add {
        /// Local team id.
        team_id: String,
        /// Local channel id.
        channel_id: String,
        remote_team_id: String,
        remote_channel_id: String,
    },
    /// Remove the link for a local channel. Succeeds if none exists.
    Remove {
        /// Local channel id.
        channel_id: String,
    },
}

pub async fn handle_links(store: &dyn BridgeStore, action: LinkAction) -> Result<()> {
    match action {
        LinkAction::Show { channel_id } => {
            let link = store.link_by_local_channel(&channel_id).await?;
            print_link(link.as_ref(), &channel_id)
        },
        LinkAction::Find {
            remote_team_id,
            remote_channel_id,
        } => {
            let link = store
                .link_by_remote_channel(&remote_team_id, &remote_channel_id)
                .await?;
            print_link(link.as_ref(), &format!("{remote_team_id}/{remote_channel_id}"))
        },
        LinkAction::Add {
            team_id,
            channel_id,
            remote_team_id,
            remote_channel_id,
        } => add(store, ChannelLink {
            local_team_id: team_id,
            local_channel_id: channel_id,
            remote_team_id,
            remote_channel_id,
        })
        .await,
        LinkAction::Remove { channel_id } => {
            store.delete_link(&channel_id).await?;
            println!("Removed link for channel {channel_id} (if any).");
            Ok(())
        },
    }
}

async fn add(store: &dyn BridgeStore, link: ChannelLink) -> Result<()> {
    match store.create_link(&link).await {
        Ok(()) => {
            println!(
                "Linked channel {} to {}/{}.",
                link.local_channel_id, link.remote_team_id, link.remote_channel_id
            );
            Ok(())
        },
        Err(e) if e.is_team_not_enabled() => {
            eprintln!(
                "Link stored, but team {} is not enabled; it stays hidden until the team is enabled.",
                link.local_team_id
            );
            Err(e.into())
        },
        Err(e) if e.is_unique_violation() => {
            anyhow::bail!(
                "channel {} is already linked; remove the existing link first",
                link.local_channel_id
            )
        },
        Err(e) => Err(e.into()),
    }
}

fn print_link(link: Option<&ChannelLink>, key: &str) -> Result<()> {
    match link {
        Some(link) => println!("{}", serde_json::to_string_pretty(link)?),
        None => println!("No link for {key}."),
    }
    Ok(())
}
