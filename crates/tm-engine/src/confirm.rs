//! Confirmation policy for destructive steps.
//!
//! The engine never reads from a terminal itself. The caller passes either
//! [`Confirmation::AutoConfirm`] or an interactive [`Prompt`], and the
//! runner asks it before a rebuild and before a rollback.

/// Something that can answer a yes/no question.
pub trait Prompt {
    /// Ask `question`; `true` means proceed.
    fn ask(&mut self, question: &str) -> bool;
}

impl<F> Prompt for F
where
    F: FnMut(&str) -> bool,
{
    fn ask(&mut self, question: &str) -> bool {
        self(question)
    }
}

/// How the runner obtains consent.
pub enum Confirmation {
    /// Proceed without asking (`--yes`, automated deploys)
    AutoConfirm,
    /// Ask before each rebuild or rollback
    Interactive(Box<dyn Prompt>),
}

impl Confirmation {
    /// Interactive confirmation through `prompt`.
    pub fn interactive(prompt: impl Prompt + 'static) -> Self {
        Confirmation::Interactive(Box::new(prompt))
    }

    /// Whether the action described by `question` may go ahead.
    pub fn confirm(&mut self, question: &str) -> bool {
        match self {
            Confirmation::AutoConfirm => true,
            Confirmation::Interactive(prompt) => {
                let answer = prompt.ask(question);
                log::debug!("confirmation '{question}': {answer}");
                answer
            }
        }
    }
}

impl std::fmt::Debug for Confirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confirmation::AutoConfirm => f.write_str("AutoConfirm"),
            Confirmation::Interactive(_) => f.write_str("Interactive"),
        }
    }
}
