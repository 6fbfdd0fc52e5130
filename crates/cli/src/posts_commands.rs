use {anyhow::Result, clap::Subcommand, teamsync_store::BridgeStore};

#[derive(Subcommand)]
pub enum PostAction {
    /// Print the remote post id for a local post.
    Local {
        /// Local post id.
        post_id: String,
    },
    /// Print the local post id for a remote post.
    Remote {
        /// Remote chat or channel id the post lives in.
        container_id: String,
        remote_post_id: String,
    },
    /// Record that a local post and a remote post are the same message.
    Link {
        /// Local post id.
        post_id: String,
        /// Remote chat or channel id.
        container_id: String,
        remote_post_id: String,
    },
}

pub async fn handle_posts(store: &dyn BridgeStore, action: PostAction) -> Result<()> {
    match action {
        PostAction::Local { post_id } => {
            match store.local_to_remote_post(&post_id).await? {
                Some(remote) => println!("{remote}"),
                None => println!("No remote post for {post_id}."),
            }
            Ok(())
        },
        PostAction::Remote {
            container_id,
            remote_post_id,
        } => {
            match store
                .remote_to_local_post(&container_id, &remote_post_id)
                .await?
            {
                Some(local) => println!("{local}"),
                None => println!("No local post for {remote_post_id} in {container_id}."),
            }
            Ok(())
        },
        PostAction::Link {
            post_id,
            container_id,
            remote_post_id,
        } => {
            store
                .link_posts(&post_id, &container_id, &remote_post_id)
                .await?;
            println!("Linked post {post_id} to {remote_post_id} in {container_id}.");
            Ok(())
        },
    }
}
