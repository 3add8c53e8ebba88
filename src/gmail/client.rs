//! Gmail API HTTP client
//!
//! Blocking calls through `ureq`; every request carries the bearer token
//! obtained from the credential store during `authenticate`.

use log::debug;
use secure_string::SecureString;
use serde::de::DeserializeOwned;

use super::api::{
    CreateDraftRequest, Draft, GmailMessage, GmailThread, ListMessagesResponse, MessageRef, RawMessage,
    SendDraftRequest,
};
use crate::client_ops::{Clock, MailboxOps};
use crate::error::ProbeError;
use crate::oauth2::{Authorizer, CredentialStore};

pub struct GmailClient<A: Authorizer, C: Clock> {
    store: CredentialStore<A, C>,
    access_token: Option<SecureString>,
}

impl<A: Authorizer, C: Clock> GmailClient<A, C> {
    /// Gmail API base URL for the authenticated user
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1/users/me";

    pub fn new(store: CredentialStore<A, C>) -> Self {
        Self {
            store,
            access_token: None,
        }
    }

    fn bearer(&self, call: &'static str) -> Result<String, ProbeError> {
        self.access_token
            .as_ref()
            .map(|token| format!("Bearer {}", token.unsecure()))
            .ok_or_else(|| ProbeError::provider(call, "client is not authenticated"))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        call: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProbeError> {
        let url = format!("{}/{}", Self::BASE_URL, path);
        debug!("{}: GET {} {:?}", call, url, query);

        let mut request = ureq::get(&url).set("Authorization", &self.bearer(call)?);
        for (name, value) in query {
            request = request.query(name, value);
        }

        let response = request.call().map_err(|e| ProbeError::from_http(call, e))?;
        response
            .into_json()
            .map_err(|e| ProbeError::provider(call, format!("failed to parse response: {}", e)))
    }

    fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        call: &'static str,
        path: &str,
        body: &B,
    ) -> Result<T, ProbeError> {
        let url = format!("{}/{}", Self::BASE_URL, path);
        debug!("{}: POST {}", call, url);

        let response = ureq::post(&url)
            .set("Authorization", &self.bearer(call)?)
            .send_json(body)
            .map_err(|e| ProbeError::from_http(call, e))?;
        response
            .into_json()
            .map_err(|e| ProbeError::provider(call, format!("failed to parse response: {}", e)))
    }
}

impl<A: Authorizer, C: Clock> MailboxOps for GmailClient<A, C> {
    fn authenticate(&mut self) -> Result<(), ProbeError> {
        let credential = self.store.obtain_credential()?;
        self.access_token = Some(credential.access_token);
        Ok(())
    }

    fn list_messages(&mut self, query: &str, max_results: u32) -> Result<Vec<MessageRef>, ProbeError> {
        let max = max_results.to_string();
        let list: ListMessagesResponse =
            self.get_json("messages.list", "messages", &[("q", query), ("maxResults", &max)])?;
        Ok(list.messages.unwrap_or_default())
    }

    fn get_message(&mut self, id: &str) -> Result<GmailMessage, ProbeError> {
        self.get_json("messages.get", &format!("messages/{}", id), &[("format", "full")])
    }

    fn get_thread(&mut self, thread_id: &str) -> Result<GmailThread, ProbeError> {
        self.get_json("threads.get", &format!("threads/{}", thread_id), &[("format", "full")])
    }

    fn send_message(&mut self, raw: &str, thread_id: Option<&str>) -> Result<GmailMessage, ProbeError> {
        let body = RawMessage {
            raw: raw.to_string(),
            thread_id: thread_id.map(String::from),
        };
        self.post_json("messages.send", "messages/send", &body)
    }

    fn create_draft(&mut self, raw: &str, thread_id: Option<&str>) -> Result<Draft, ProbeError> {
        let body = CreateDraftRequest {
            message: RawMessage {
                raw: raw.to_string(),
                thread_id: thread_id.map(String::from),
            },
        };
        self.post_json("drafts.create", "drafts", &body)
    }

    fn send_draft(&mut self, draft_id: &str) -> Result<GmailMessage, ProbeError> {
        let body = SendDraftRequest {
            id: draft_id.to_string(),
        };
        self.post_json("drafts.send", "drafts/send", &body)
    }
}
