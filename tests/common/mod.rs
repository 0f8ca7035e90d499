//! Shared harness for the end-to-end tests: a temporary config root, a
//! wiremock server and the real command pipeline.

use anyhow::Result;
use bluepreset::cmd_args::CommandLineArgs;
use bluepreset::commands::{self, CommandContext};
use bluepreset::store::Document;
use bluepreset::variables::ScriptedPrompter;
use bluepreset::workspace::{DocumentKind, Session, Workspace};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct PresetWorld {
    root: TempDir,
    pub server: MockServer,
    prompter: ScriptedPrompter,
    output: Vec<u8>,
}

impl PresetWorld {
    pub async fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            server: MockServer::start().await,
            prompter: ScriptedPrompter::default(),
            output: Vec::new(),
        }
    }

    /// Mount the responses used across the suite
    pub async fn mount_api(&self) {
        Mock::given(method("GET"))
            .and(path("/api/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": 1, "name": "John Doe"},
                {"id": 2, "name": "Jane Smith"}
            ])))
            .mount(&self.server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/users"))
            .and(header("Authorization", "Bearer s3cret"))
            .and(body_json(serde_json::json!({"name": "John Doe", "admin": true})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"id": 3, "name": "John Doe"})),
            )
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/search"))
            .and(query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_string("found"))
            .mount(&self.server)
            .await;
    }

    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.server.uri(), route)
    }

    pub fn answer<const N: usize>(&mut self, answers: [&str; N]) {
        self.prompter = ScriptedPrompter::new(answers);
    }

    pub fn asked(&self) -> Vec<String> {
        self.prompter.asked().to_vec()
    }

    pub async fn run(&mut self, args: &[&str]) -> Result<()> {
        let argv = std::iter::once("bluepreset").chain(args.iter().copied());
        let command = CommandLineArgs::try_parse_from(argv)?.into_command()?;

        let mut ctx = CommandContext {
            workspace: self.workspace(),
            session: Session::load(self.root.path(), "it"),
            prompter: &mut self.prompter,
            out: &mut self.output,
            editor: "true".to_string(),
        };
        let result = commands::execute(&command, &mut ctx).await;
        ctx.session.save_if_changed()?;
        result
    }

    pub fn take_output(&mut self) -> String {
        String::from_utf8(std::mem::take(&mut self.output)).unwrap()
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.root.path().join("presets"))
    }

    pub fn document(&self, preset: &str, kind: DocumentKind) -> Document {
        self.workspace().load_document(preset, kind).unwrap()
    }
}
