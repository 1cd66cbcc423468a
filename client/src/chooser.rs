//! Sources of county choices for members whose ZIP spans several counties

use std::collections::BTreeMap;
use std::io::Write;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::error::ClientResult;
use shared::{CountyId, MemberId, MemberSnapshot};

/// One selectable county, labelled for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyChoice {
    pub id: CountyId,
    pub name: String,
}

#[mockall::automock]
#[async_trait]
pub trait CountyChooser: Send + Sync {
    /// Pick a county for the member. `None` leaves the member unresolved.
    async fn choose(&self, member: &MemberSnapshot, choices: &[CountyChoice]) -> ClientResult<Option<CountyId>>;
}

/// Choices fixed up front (e.g. `--choose m1=25025`), with an optional
/// chooser asked for everyone else
pub struct PresetCountyChooser {
    choices: BTreeMap<MemberId, CountyId>,
    fallback: Option<Box<dyn CountyChooser>>,
}

impl PresetCountyChooser {
    pub fn new(choices: BTreeMap<MemberId, CountyId>) -> Self {
        Self {
            choices,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: impl CountyChooser + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }
}

#[async_trait]
impl CountyChooser for PresetCountyChooser {
    async fn choose(&self, member: &MemberSnapshot, choices: &[CountyChoice]) -> ClientResult<Option<CountyId>> {
        if let Some(county_id) = self.choices.get(&member.id) {
            return Ok(Some(county_id.clone()));
        }
        match &self.fallback {
            Some(fallback) => fallback.choose(member, choices).await,
            None => Ok(None),
        }
    }
}

/// Prompts on stdout and reads the answer from stdin
pub struct StdinCountyChooser {
    input: Mutex<BufReader<Stdin>>,
}

impl StdinCountyChooser {
    pub fn new() -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for StdinCountyChooser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CountyChooser for StdinCountyChooser {
    async fn choose(&self, member: &MemberSnapshot, choices: &[CountyChoice]) -> ClientResult<Option<CountyId>> {
        let zip = member.zip_code.as_ref().map(|zip| zip.as_str()).unwrap_or("?");
        let mut prompt = format!(
            "\n{} {} (ZIP {}) lives in a ZIP spanning several counties:\n",
            member.first_name, member.last_name, zip
        );
        for (index, choice) in choices.iter().enumerate() {
            prompt.push_str(&format!("  {}) {} ({})\n", index + 1, choice.name, choice.id));
        }
        prompt.push_str("Enter a number, a county id, or leave blank to skip: ");

        let mut stdout = std::io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        self.input.lock().await.read_line(&mut line).await?;
        Ok(parse_selection(&line, choices))
    }
}

/// A 1-based index into `choices`, or a county id typed by hand
pub fn parse_selection(input: &str, choices: &[CountyChoice]) -> Option<CountyId> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(index) = trimmed.parse::<usize>() {
        if (1..=choices.len()).contains(&index) {
            return Some(choices[index - 1].id.clone());
        }
    }
    Some(CountyId::from(trimmed))
}
