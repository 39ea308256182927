use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, MultiSelect, Select};

use crate::filter::{parse_days, Format, PeriodKind, MAX_DAYS, MIN_DAYS};
use crate::prompt::{PromptAction, PromptError, PromptUi};

/// Interactive prompt on the controlling terminal.
pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptUi for TerminalPrompt {
    fn pick_domains(&mut self, catalog: &[String], selected: &[String]) -> Result<Vec<String>, PromptError> {
        if catalog.is_empty() {
            eprintln!("The server has no domains with reports.");
            return Ok(Vec::new());
        }
        let defaults: Vec<bool> = catalog.iter().map(|d| selected.contains(d)).collect();
        let picked = MultiSelect::with_theme(&self.theme)
            .with_prompt("Domains (space to toggle)")
            .items(catalog)
            .defaults(&defaults)
            .interact()?;
        Ok(picked.into_iter().map(|i| catalog[i].clone()).collect())
    }

    fn pick_period(&mut self, current: PeriodKind) -> Result<PeriodKind, PromptError> {
        let titles: Vec<&str> = PeriodKind::ALL.iter().map(|k| k.title()).collect();
        let default = PeriodKind::ALL.iter().position(|k| *k == current).unwrap_or(0);
        let index = Select::with_theme(&self.theme)
            .with_prompt("Period")
            .items(&titles)
            .default(default)
            .interact()?;
        Ok(PeriodKind::ALL[index])
    }

    fn enter_days(&mut self, current: &str) -> Result<String, PromptError> {
        let value: String = Input::with_theme(&self.theme)
            .with_prompt("Days")
            .with_initial_text(current)
            .validate_with(|input: &String| -> Result<(), String> {
                match input.trim().parse::<u32>() {
                    Ok(n) if (MIN_DAYS..=MAX_DAYS).contains(&n) => Ok(()),
                    _ => Err(format!("Enter a number from {} to {}", MIN_DAYS, MAX_DAYS)),
                }
            })
            .interact_text()?;
        Ok(parse_days(&value).to_string())
    }

    fn pick_format(&mut self, current: Format) -> Result<Format, PromptError> {
        let titles: Vec<&str> = Format::ALL.iter().map(|f| f.title()).collect();
        let default = Format::ALL.iter().position(|f| *f == current).unwrap_or(0);
        let index = Select::with_theme(&self.theme)
            .with_prompt("Format")
            .items(&titles)
            .default(default)
            .interact()?;
        Ok(Format::ALL[index])
    }

    fn pick_action(&mut self, can_apply: bool) -> Result<PromptAction, PromptError> {
        let mut actions = Vec::with_capacity(4);
        if can_apply {
            actions.push((PromptAction::Apply, "Apply"));
        }
        actions.push((PromptAction::Edit, "Edit again"));
        actions.push((PromptAction::Reset, "Reset"));
        actions.push((PromptAction::Cancel, "Cancel"));

        let titles: Vec<&str> = actions.iter().map(|(_, t)| *t).collect();
        let index = Select::with_theme(&self.theme)
            .with_prompt(if can_apply {
                "Report options"
            } else {
                "Pick at least one domain"
            })
            .items(&titles)
            .default(0)
            .interact()?;
        Ok(actions[index].0)
    }
}
