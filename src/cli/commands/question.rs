//! Question bank commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::CliContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::{Question, MAX_DIFFICULTY, MIN_DIFFICULTY};

#[derive(Args, Debug)]
pub struct QuestionArgs {
    #[command(subcommand)]
    pub command: QuestionCommands,
}

#[derive(Subcommand, Debug)]
pub enum QuestionCommands {
    /// Add or replace a question
    Add {
        question_id: String,
        topic_id: String,
        /// Difficulty level, 1-10
        difficulty: f64,
        /// Expected answer (compared case-insensitively)
        correct_answer: String,
    },
    /// Pick the bank difficulty closest to a learner's level
    Select {
        learner_id: String,
        topic_id: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct QuestionActionOutput {
    pub success: bool,
    pub message: String,
    pub difficulty: Option<f64>,
}

impl CommandOutput for QuestionActionOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

pub async fn execute(args: QuestionArgs, ctx: &CliContext, json_mode: bool) -> Result<()> {
    let out = match args.command {
        QuestionCommands::Add {
            question_id,
            topic_id,
            difficulty,
            correct_answer,
        } => {
            if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
                return Err(DomainError::Validation(format!(
                    "question difficulty must be within {MIN_DIFFICULTY}..={MAX_DIFFICULTY}, got {difficulty}"
                ))
                .into());
            }
            let question = Question::new(&question_id, &topic_id, difficulty, correct_answer);
            ctx.questions.insert_question(&question).await?;
            QuestionActionOutput {
                success: true,
                message: format!("Question {question_id} saved in {topic_id} at difficulty {difficulty:.1}"),
                difficulty: Some(difficulty),
            }
        }
        QuestionCommands::Select { learner_id, topic_id } => {
            let difficulty = ctx
                .service
                .recommend_question_difficulty(&learner_id, &topic_id)
                .await?;
            let message = match difficulty {
                Some(d) => format!("Serve a {topic_id} question at difficulty {d:.1}"),
                None => format!("No questions in {topic_id} yet"),
            };
            QuestionActionOutput {
                success: difficulty.is_some(),
                message,
                difficulty,
            }
        }
    };

    output(&out, json_mode);
    Ok(())
}
