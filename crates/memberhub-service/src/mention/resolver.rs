//! Resolves `@username` tokens in free text to member ids.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use memberhub_core::AppResult;
use memberhub_store::traits::UserDirectory;

/// Mention token: `@` followed by a username, where the `@` does not butt
/// up against a preceding word character (so email addresses stay plain
/// text). Usernames start and end with a word character, with dots and
/// hyphens allowed inside, so trailing sentence punctuation is never
/// captured.
static MENTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_])@([A-Za-z0-9_](?:[A-Za-z0-9_.-]{0,30}[A-Za-z0-9_])?)")
        .unwrap()
});

/// Turns message and post text into the list of members it mentions.
///
/// Unknown names and inactive accounts are dropped silently; a token that
/// resolves to nobody is just text. Directory failures do propagate, since
/// the caller is about to fan out on the result.
#[derive(Clone)]
pub struct MentionResolver {
    directory: Arc<dyn UserDirectory>,
}

impl MentionResolver {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// All active members mentioned in the text, first occurrence order,
    /// each at most once.
    pub async fn resolve(&self, text: &str) -> AppResult<Vec<Uuid>> {
        let mut seen_names = HashSet::new();
        let mut seen_ids = HashSet::new();
        let mut resolved = Vec::new();

        for capture in MENTION_PATTERN.captures_iter(text) {
            let username = &capture[1];
            if !seen_names.insert(username.to_lowercase()) {
                continue;
            }

            match self.directory.find_by_username(username).await? {
                Some(user) if user.is_active() => {
                    if seen_ids.insert(user.id) {
                        resolved.push(user.id);
                    }
                }
                Some(user) => {
                    debug!(username = %user.username, "Dropping mention of inactive member");
                }
                None => {
                    debug!(username, "Dropping unresolvable mention");
                }
            }
        }

        Ok(resolved)
    }

    /// Like [`Self::resolve`], minus the author. Self-mentions never
    /// notify.
    pub async fn resolve_excluding(&self, text: &str, author_id: Uuid) -> AppResult<Vec<Uuid>> {
        let mut resolved = self.resolve(text).await?;
        resolved.retain(|id| *id != author_id);
        Ok(resolved)
    }
}

impl std::fmt::Debug for MentionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentionResolver").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memberhub_entity::user::{User, UserRole, UserStatus};
    use memberhub_store::Store;

    async fn seed(store: &Store, username: &str, status: UserStatus) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            display_name: username.to_string(),
            role: UserRole::Franchisee,
            status,
        };
        store.users.insert(&user).await.unwrap();
        user.id
    }

    #[tokio::test]
    async fn test_resolves_known_names_and_drops_the_rest() {
        let store = Store::in_memory();
        let kenji = seed(&store, "kenji", UserStatus::Active).await;
        let maria = seed(&store, "maria.lopez", UserStatus::Active).await;
        let resolver = MentionResolver::new(Arc::clone(&store.users));

        let resolved = resolver
            .resolve("@kenji did you see what @maria.lopez and @nobody wrote?")
            .await
            .unwrap();
        assert_eq!(resolved, vec![kenji, maria]);
    }

    #[tokio::test]
    async fn test_mentions_are_case_insensitive_and_deduplicated() {
        let store = Store::in_memory();
        let kenji = seed(&store, "kenji", UserStatus::Active).await;
        let resolver = MentionResolver::new(Arc::clone(&store.users));

        let resolved = resolver
            .resolve("@kenji @KENJI @Kenji three times, one mention")
            .await
            .unwrap();
        assert_eq!(resolved, vec![kenji]);
    }

    #[tokio::test]
    async fn test_inactive_members_are_dropped() {
        let store = Store::in_memory();
        seed(&store, "ghost", UserStatus::Suspended).await;
        let active = seed(&store, "active", UserStatus::Active).await;
        let resolver = MentionResolver::new(Arc::clone(&store.users));

        let resolved = resolver.resolve("@ghost and @active").await.unwrap();
        assert_eq!(resolved, vec![active]);
    }

    #[tokio::test]
    async fn test_trailing_punctuation_stays_out_of_the_name() {
        let store = Store::in_memory();
        let kenji = seed(&store, "kenji", UserStatus::Active).await;
        let resolver = MentionResolver::new(Arc::clone(&store.users));

        let resolved = resolver.resolve("thanks @kenji.").await.unwrap();
        assert_eq!(resolved, vec![kenji]);
    }

    #[tokio::test]
    async fn test_author_is_excluded_from_their_own_mentions() {
        let store = Store::in_memory();
        let author = seed(&store, "author", UserStatus::Active).await;
        let other = seed(&store, "other", UserStatus::Active).await;
        let resolver = MentionResolver::new(Arc::clone(&store.users));

        let resolved = resolver
            .resolve_excluding("@author and @other", author)
            .await
            .unwrap();
        assert_eq!(resolved, vec![other]);
    }

    #[tokio::test]
    async fn test_plain_text_resolves_to_nobody() {
        let store = Store::in_memory();
        let resolver = MentionResolver::new(Arc::clone(&store.users));
        let resolved = resolver
            .resolve("an email like a@b.c is not a mention target here")
            .await
            .unwrap();
        assert!(resolved.is_empty());
    }
}
