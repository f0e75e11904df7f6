// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;

use chrono::Local;

use crate::artifact::{Artifact, ArtifactHeader};
use crate::auth::{AuthContext, Token, exchange_token, request_otp};
use crate::catalog::{
    Batch, Subject, default_subject_ids, list_batches, list_subjects, parse_subject_selection,
    select_batch,
};
use crate::chat::ChatSession;
use crate::config::ApiConfig;
use crate::error::SessionError;
use crate::extract::{ExtractOptions, ExtractSummary, ExtractTarget, extract};
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

const DEFAULT_RESOLUTION: &str = "any";

/// How the session obtains its bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    /// Phone number and one-time code
    Otp,
    /// Token pasted directly by the user
    Token,
}

/// Options for an interactive session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub login: LoginMethod,
    /// Directory the temporary artifact is created in
    pub work_dir: PathBuf,
    pub extract: ExtractOptions,
}

/// Outcome of a completed session
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub batch: Batch,
    pub resolution: String,
    /// Name the artifact was delivered under
    pub file_name: String,
    pub extract: ExtractSummary,
}

/// Run one complete export conversation.
///
/// Token, batch choice, subject choice and resolution are collected through
/// `chat` in that order; the export is written to a temporary artifact,
/// delivered, and the artifact is removed whether or not delivery succeeded.
/// A failing step is reported to the user before the error is returned.
pub async fn run_session<C, H>(
    client: &C,
    config: &ApiConfig,
    chat: &H,
    options: &SessionOptions,
    reporter: &SharedProgressReporter,
) -> Result<SessionSummary, SessionError>
where
    C: HttpClient + ?Sized,
    H: ChatSession + ?Sized,
{
    match drive_session(client, config, chat, options, reporter).await {
        Ok(summary) => Ok(summary),
        Err(e) => {
            tracing::error!(error = %e, "session aborted");
            if let Err(say_error) = chat.say(&format!("Error: {e}")).await {
                tracing::warn!(error = %say_error, "could not report error to the user");
            }
            Err(e)
        }
    }
}

async fn drive_session<C, H>(
    client: &C,
    config: &ApiConfig,
    chat: &H,
    options: &SessionOptions,
    reporter: &SharedProgressReporter,
) -> Result<SessionSummary, SessionError>
where
    C: HttpClient + ?Sized,
    H: ChatSession + ?Sized,
{
    let token = acquire_token(client, config, chat, options.login).await?;
    let auth = AuthContext::new(config, token);

    reporter.report(ProgressEvent::FetchingBatches);
    let batches = list_batches(client, config, &auth).await?;
    let reply = chat.ask(&batch_menu(&batches)).await?;
    let batch = select_batch(&batches, &reply)?;
    chat.say(&format!("Selected batch: {}", batch.name)).await?;

    reporter.report(ProgressEvent::FetchingSubjects {
        batch_name: batch.name.clone(),
    });
    let subjects = list_subjects(client, config, &auth, &batch.id).await?;
    chat.say(&subject_menu(&subjects)).await?;

    let default_ids = default_subject_ids(&subjects).join("&");
    let reply = chat
        .ask(&format!(
            "Now send the subject IDs to download.\n\n\
             Send them like 1&2&3&4, or paste the IDs below to download the full batch:\n\n\
             {default_ids}"
        ))
        .await?;
    let selected_ids = parse_subject_selection(&reply)?;

    let reply = chat.ask("Enter resolution (or type 'any')").await?;
    let resolution = match reply.trim() {
        "" => DEFAULT_RESOLUTION.to_string(),
        value => value.to_string(),
    };

    let mut artifact =
        Artifact::create(&options.work_dir).map_err(|e| SessionError::ArtifactCreate {
            path: options.work_dir.clone(),
            source: e,
        })?;
    tracing::debug!(path = %artifact.path().display(), "artifact created");

    let file_name = sanitize_filename::sanitize(format!("{}.txt", batch.name));
    let outcome = async {
        artifact.write_header(&ArtifactHeader {
            batch_name: batch.name.clone(),
            resolution: resolution.clone(),
            generated_at: Local::now(),
        })?;

        let target = ExtractTarget {
            batch_id: &batch.id,
            subjects: &subjects,
            selected_ids: &selected_ids,
        };
        let summary = extract(
            client,
            config,
            &auth,
            &target,
            &mut artifact,
            &options.extract,
            reporter,
        )
        .await?;

        let caption = format!(
            "Batch: {}\nResolution requested: {}\nLinks: {}",
            batch.name, resolution, summary.records
        );
        chat.deliver(artifact.path(), &file_name, &caption).await?;
        Ok::<_, SessionError>(summary)
    }
    .await;

    let removal = artifact.close();
    let summary = match outcome {
        Ok(summary) => summary,
        Err(e) => {
            if let Err((path, source)) = removal {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "failed to remove artifact"
                );
            }
            return Err(e);
        }
    };
    removal.map_err(|(path, source)| SessionError::ArtifactRemove { path, source })?;

    Ok(SessionSummary {
        batch,
        resolution,
        file_name,
        extract: summary,
    })
}

async fn acquire_token<C, H>(
    client: &C,
    config: &ApiConfig,
    chat: &H,
    login: LoginMethod,
) -> Result<Token, SessionError>
where
    C: HttpClient + ?Sized,
    H: ChatSession + ?Sized,
{
    match login {
        LoginMethod::Token => {
            let reply = chat.ask("Enter your access token").await?;
            Ok(Token::from_input(&reply)?)
        }
        LoginMethod::Otp => {
            let phone = chat
                .ask("Enter your mobile number without country code")
                .await?;
            let phone = phone.trim();
            request_otp(client, config, phone).await?;

            let code = chat
                .ask("Enter the OTP sent to your mobile number")
                .await?;
            let token = exchange_token(client, config, phone, code.trim()).await?;
            chat.say(&format!("Your token: {token}")).await?;
            Ok(token)
        }
    }
}

fn batch_menu(batches: &[Batch]) -> String {
    let mut text = String::from("You have these batches:\n\nIndex : Batch ID : Batch Name\n\n");
    for (index, batch) in batches.iter().enumerate() {
        text.push_str(&format!("{}. {} : {}\n", index + 1, batch.id, batch.name));
    }
    text.push_str("\nReply with an index or a batch ID");
    text
}

fn subject_menu(subjects: &[Subject]) -> String {
    let mut text = String::from("Subject : Subject ID\n\n");
    for subject in subjects {
        text.push_str(&format!(
            "{} : {} (items: {})\n",
            subject.name, subject.id, subject.item_count
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::ScriptedChat;
    use crate::error::{AuthError, CatalogError, ChatError};
    use crate::http::testing::MockHttpClient;
    use crate::progress::NoopReporter;
    use tempfile::tempdir;

    const FILTER: &str = "mode=1&filter=false&exam=&amount=&organisationId=5eb393ee95fab7468a79d189&classes=&limit=50&page=1&programId=";
    const V3: &str = "https://api.penpencil.co/v3";

    fn batches_url() -> String {
        format!("{V3}/batches/my-batches?{FILTER}")
    }

    fn details_url(batch: &str) -> String {
        format!("{V3}/batches/{batch}/details?{FILTER}")
    }

    fn topics_url(batch: &str, subject: &str, page: u64) -> String {
        format!("{V3}/batches/{batch}/subject/{subject}/topics?page={page}")
    }

    fn catalog_client() -> MockHttpClient {
        MockHttpClient::new()
            .respond(&batches_url(), r#"{"data": [{"_id": "b1", "name": "Batch A"}]}"#)
            .respond(
                &details_url("b1"),
                r#"{"data": {"subjects": [{"_id": "s1", "subject": "Math", "tagCount": 22}]}}"#,
            )
            .respond(
                &topics_url("b1", "s1", 1),
                r#"{"data": [{"topic": "Ch1", "url": "http://x/1"}]}"#,
            )
            .respond(&topics_url("b1", "s1", 2), r#"{"data": []}"#)
    }

    fn options(work_dir: PathBuf, login: LoginMethod) -> SessionOptions {
        SessionOptions {
            login,
            work_dir,
            extract: ExtractOptions::default(),
        }
    }

    #[tokio::test]
    async fn end_to_end_with_direct_token() {
        let dir = tempdir().unwrap();
        let client = catalog_client();
        let chat = ScriptedChat::new(&["tok", "1", "s1", "720p"]);

        let summary = run_session(
            &client,
            &ApiConfig::default(),
            &chat,
            &options(dir.path().to_path_buf(), LoginMethod::Token),
            &NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert_eq!(summary.batch.name, "Batch A");
        assert_eq!(summary.resolution, "720p");
        assert_eq!(summary.file_name, "Batch A.txt");
        assert_eq!(summary.extract.records, 1);

        let deliveries = chat.deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 1);
        let delivery = &deliveries[0];

        let records: Vec<&str> = delivery
            .content
            .lines()
            .filter(|l| l.contains(" : "))
            .collect();
        assert_eq!(records.len(), 1);
        assert!(records[0].starts_with("Ch1 : http://x/1 | https://"));
        assert!(records[0].ends_with("url=http%3A%2F%2Fx%2F1&token=tok"));
        assert!(delivery.content.starts_with("Batch: Batch A\nResolution: 720p\n"));
        assert!(delivery.content.contains("===== Math (s1) ====="));
        assert!(delivery.caption.contains("Resolution requested: 720p"));

        let topic_requests: Vec<String> = client
            .requested_urls()
            .into_iter()
            .filter(|u| u.contains("/topics"))
            .collect();
        assert_eq!(
            topic_requests,
            vec![topics_url("b1", "s1", 1), topics_url("b1", "s1", 2)]
        );

        assert!(!delivery.path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn artifact_removed_when_delivery_fails() {
        let dir = tempdir().unwrap();
        let client = catalog_client();
        let chat = ScriptedChat::new(&["tok", "1", "s1", ""]).failing_delivery();

        let err = run_session(
            &client,
            &ApiConfig::default(),
            &chat,
            &options(dir.path().to_path_buf(), LoginMethod::Token),
            &NoopReporter::shared(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SessionError::Chat(ChatError::Delivery { .. })));

        let deliveries = chat.deliveries.lock().unwrap();
        assert!(deliveries[0].caption.contains("Resolution requested: any"));
        assert!(!deliveries[0].path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn otp_login_announces_token() {
        let dir = tempdir().unwrap();
        let client = catalog_client()
            .respond(
                "https://api.penpencil.co/v1/users/get-otp?smsType=0",
                r#"{"status": true}"#,
            )
            .respond(
                "https://api.penpencil.co/v3/oauth/token",
                r#"{"data": {"accessToken": "fresh"}}"#,
            );
        let chat = ScriptedChat::new(&[" 9876543210 ", "4321", "b1", "s1", "any"]);

        let summary = run_session(
            &client,
            &ApiConfig::default(),
            &chat,
            &options(dir.path().to_path_buf(), LoginMethod::Otp),
            &NoopReporter::shared(),
        )
        .await
        .unwrap();

        assert_eq!(summary.batch.id, "b1");
        assert!(
            chat.messages
                .lock()
                .unwrap()
                .contains(&"Your token: fresh".to_string())
        );

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].json.as_ref().unwrap()["username"], "9876543210");
        assert_eq!(requests[1].json.as_ref().unwrap()["otp"], "4321");
        assert!(
            requests[2]
                .headers
                .iter()
                .any(|(k, v)| k == "authorization" && v == "Bearer fresh")
        );
    }

    #[tokio::test]
    async fn invalid_index_aborts_and_tells_the_user() {
        let dir = tempdir().unwrap();
        let chat = ScriptedChat::new(&["tok", "5"]);

        let err = run_session(
            &catalog_client(),
            &ApiConfig::default(),
            &chat,
            &options(dir.path().to_path_buf(), LoginMethod::Token),
            &NoopReporter::shared(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            SessionError::Catalog(CatalogError::InvalidIndex { index: 5, .. })
        ));
        let messages = chat.messages.lock().unwrap();
        assert!(messages.last().unwrap().starts_with("Error: Invalid batch index 5"));
    }

    #[tokio::test]
    async fn failed_error_report_keeps_original_error() {
        let dir = tempdir().unwrap();
        let chat = ScriptedChat::new(&["tok", "5"]).failing_messages();

        let err = run_session(
            &catalog_client(),
            &ApiConfig::default(),
            &chat,
            &options(dir.path().to_path_buf(), LoginMethod::Token),
            &NoopReporter::shared(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            SessionError::Catalog(CatalogError::InvalidIndex { index: 5, .. })
        ));
        assert!(chat.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_subject_selection_aborts_before_artifact() {
        let dir = tempdir().unwrap();
        let chat = ScriptedChat::new(&["tok", "1", "   "]);

        let err = run_session(
            &catalog_client(),
            &ApiConfig::default(),
            &chat,
            &options(dir.path().to_path_buf(), LoginMethod::Token),
            &NoopReporter::shared(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            SessionError::Catalog(CatalogError::NoSubjectIdsProvided)
        ));
        assert!(chat.deliveries.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn empty_token_is_rejected() {
        let dir = tempdir().unwrap();
        let chat = ScriptedChat::new(&["  "]);

        let err = run_session(
            &MockHttpClient::new(),
            &ApiConfig::default(),
            &chat,
            &options(dir.path().to_path_buf(), LoginMethod::Token),
            &NoopReporter::shared(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SessionError::Auth(AuthError::EmptyToken)));
    }

    #[test]
    fn menus_list_entries_in_order() {
        let batches = vec![
            Batch {
                id: "b1".into(),
                name: "Batch A".into(),
            },
            Batch {
                id: "b2".into(),
                name: "Batch B".into(),
            },
        ];
        let menu = batch_menu(&batches);
        assert!(menu.contains("1. b1 : Batch A\n2. b2 : Batch B\n"));

        let subjects = vec![Subject {
            id: "s1".into(),
            name: "Math".into(),
            item_count: 22,
        }];
        assert!(subject_menu(&subjects).contains("Math : s1 (items: 22)"));
    }
}
