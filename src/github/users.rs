use crate::{
    error::Result,
    github::{GitHubClient, types::User},
};

impl GitHubClient {
    /// The account the token belongs to.
    pub(crate) async fn current_user(&self) -> Result<User> {
        self.get("/user").await
    }
}
