//! Full directory listing over the provider's paged API.

use crate::providers::{IdentityProvider, MAX_LIST_USERS_RESULTS, ProviderError, UserRecord};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The reduced projection of a user returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub creation_time: Option<String>,
    pub last_sign_in_time: Option<String>,
}

impl From<UserRecord> for UserSummary {
    fn from(record: UserRecord) -> Self {
        UserSummary {
            uid: record.uid,
            email: record.email,
            display_name: record.display_name,
            creation_time: record.metadata.creation_time,
            last_sign_in_time: record.metadata.last_sign_in_time,
        }
    }
}

/// Fetch every page, in provider order, until no cursor is returned.
///
/// A failure on any page discards what was already collected. A cursor the
/// provider already handed out is reported as an error, so a misbehaving
/// provider cannot keep the loop running forever.
pub async fn collect_all_users<P>(provider: &P) -> Result<Vec<UserSummary>, ProviderError>
where
    P: IdentityProvider,
{
    let mut users = Vec::new();
    let mut seen_tokens = HashSet::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = provider
            .list_users(MAX_LIST_USERS_RESULTS, page_token.as_deref())
            .await?;
        pages += 1;
        trace!("Page {} returned {} users", pages, page.users.len());

        users.extend(page.users.into_iter().map(UserSummary::from));

        match page.page_token {
            Some(token) => {
                if !seen_tokens.insert(token.clone()) {
                    return Err(ProviderError::Unexpected {
                        code: None,
                        message: format!(
                            "User listing returned page token \"{}\" more than once",
                            token
                        ),
                    });
                }
                page_token = Some(token);
            }
            None => break,
        }
    }

    debug!("Listed {} users across {} pages", users.len(), pages);
    Ok(users)
}
