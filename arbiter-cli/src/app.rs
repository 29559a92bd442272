use std::io::Write;
use std::path::{Path, PathBuf};

use arbiter_core::serde_utils::from_json_str;
use arbiter_rules::load_rule_strings;
use colored::*;
use serde_json::Value;
use tracing::{debug, info};

use crate::client::RulesClient;
use crate::error::CliError;
use crate::output::{render_combined, render_error, render_result, render_rule, TOO_FEW_RULES};
use crate::session::SessionStore;

/// Whether a command did what was asked. Failed commands exit with status 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Succeeded,
    Failed,
}

/// Where `evaluate` reads its data record and rule from.
#[derive(Debug, Clone, Default)]
pub struct EvaluateInput {
    pub data: Option<String>,
    pub data_file: Option<PathBuf>,
    pub rule: Option<String>,
    pub rule_file: Option<PathBuf>,
}

pub struct App<W: Write> {
    client: RulesClient,
    session: SessionStore,
    out: W,
}

impl<W: Write> App<W> {
    pub fn new(client: RulesClient, session: SessionStore, out: W) -> Self {
        Self {
            client,
            session,
            out,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub async fn create(&mut self, rule: &str) -> Result<Status, CliError> {
        let (text, status) = match self.client.create_rule(rule).await {
            Ok(created) => (render_rule(&created.rule)?, Status::Succeeded),
            Err(err) => (render_error(err), Status::Failed),
        };

        writeln!(self.out, "{text}")?;
        self.session.set_last_output(text);
        self.session.save()?;
        Ok(status)
    }

    pub async fn combine(
        &mut self,
        rules: Vec<String>,
        file: Option<&Path>,
    ) -> Result<Status, CliError> {
        let rules = self.collect_rules(rules, file)?;
        if rules.len() < 2 {
            writeln!(self.out, "{TOO_FEW_RULES}")?;
            return Ok(Status::Failed);
        }

        debug!(count = rules.len(), "combining rules");
        let status = match self.client.combine_rules(&rules).await {
            Ok(combined) => {
                let text = render_rule(&combined.rule)?;
                writeln!(self.out, "{text}")?;
                writeln!(self.out, "{}", render_combined(&combined.rule_id))?;
                info!(rule_id = %combined.rule_id, "rules combined");
                self.session.set_last_output(text);
                Status::Succeeded
            }
            Err(err) => {
                let text = render_error(err);
                writeln!(self.out, "{text}")?;
                self.session.set_last_output(text);
                Status::Failed
            }
        };

        self.session.save()?;
        Ok(status)
    }

    fn collect_rules(
        &self,
        rules: Vec<String>,
        file: Option<&Path>,
    ) -> Result<Vec<String>, CliError> {
        let rules = if !rules.is_empty() {
            rules
        } else if let Some(path) = file {
            load_rule_strings(path)?
        } else {
            self.session.draft_rules()
        };

        Ok(rules
            .into_iter()
            .filter(|rule| !rule.trim().is_empty())
            .collect())
    }

    pub async fn evaluate(&mut self, input: &EvaluateInput) -> Result<Status, CliError> {
        let text = match self.evaluation_request(input) {
            Ok((rule, data)) => match self.client.evaluate_rule(&rule, &data).await {
                Ok(evaluation) => {
                    writeln!(self.out, "{}", render_result(&evaluation.result))?;
                    return Ok(Status::Succeeded);
                }
                Err(err) => render_error(err),
            },
            Err(err) => render_error(err),
        };

        writeln!(self.out, "{text}")?;
        Ok(Status::Failed)
    }

    fn evaluation_request(&self, input: &EvaluateInput) -> Result<(Value, Value), CliError> {
        let rule_text = match (&input.rule, &input.rule_file) {
            (Some(rule), _) => rule.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => self
                .session
                .last_output()
                .map(str::to_string)
                .ok_or_else(|| {
                    CliError::Input("no rule to evaluate; run create or combine first".into())
                })?,
        };
        let data_text = match (&input.data, &input.data_file) {
            (Some(data), _) => data.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => return Err(CliError::Input("no data record given".into())),
        };

        let rule: Value = from_json_str(&rule_text)?;
        let data: Value = from_json_str(&data_text)?;
        Ok((rule, data))
    }

    pub async fn show(&mut self, rule_id: &str) -> Result<Status, CliError> {
        match self.client.fetch_rule(rule_id).await {
            Ok(stored) => {
                writeln!(self.out, "{}", render_rule(&stored)?)?;
                Ok(Status::Succeeded)
            }
            Err(err) => {
                writeln!(self.out, "{}", render_error(err))?;
                Ok(Status::Failed)
            }
        }
    }

    pub fn draft_add(&mut self, rule: Option<String>) -> Result<Status, CliError> {
        let id = self.session.add_draft(rule.unwrap_or_default());
        self.session.save()?;
        writeln!(self.out, "{} {id}", "Added draft".green().bold())?;
        Ok(Status::Succeeded)
    }

    pub fn draft_remove(&mut self, id: u64) -> Result<Status, CliError> {
        match self.session.remove_draft(id) {
            Ok(removed) => {
                self.session.save()?;
                writeln!(self.out, "{} {}", "Removed draft".green().bold(), removed.id)?;
                Ok(Status::Succeeded)
            }
            Err(err) => {
                writeln!(self.out, "{}", render_error(err))?;
                Ok(Status::Failed)
            }
        }
    }

    pub fn draft_list(&mut self) -> Result<Status, CliError> {
        if self.session.drafts().is_empty() {
            writeln!(self.out, "{}", "No draft rules.".dimmed())?;
            return Ok(Status::Succeeded);
        }

        for draft in self.session.drafts() {
            writeln!(self.out, "{}: {}", draft.id.to_string().bold(), draft.rule)?;
        }
        Ok(Status::Succeeded)
    }

    pub fn draft_clear(&mut self) -> Result<Status, CliError> {
        let removed = self.session.clear_drafts();
        self.session.save()?;
        writeln!(self.out, "{} {removed}", "Cleared drafts:".green().bold())?;
        Ok(Status::Succeeded)
    }
}
