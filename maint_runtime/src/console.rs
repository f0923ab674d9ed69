//! Console interaction port.
//!
//! Every reader loops until the input satisfies its rule, printing the
//! rule after each rejected line. End of input is the only way out of a
//! prompt without a valid value.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use maint_engine::commands::{is_valid_email, is_valid_phone, validate_person_name};

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("console input closed")]
    InputClosed,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Blocking prompt/validate primitives.
///
/// Implementors supply `read_line` and `say`; the validated readers are
/// built on those two.
pub trait Prompter {
    /// Print `prompt` and read one line without its line ending.
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError>;

    fn say(&mut self, text: &str) -> Result<(), ConsoleError>;

    fn read_positive_int(&mut self, prompt: &str) -> Result<i32, ConsoleError> {
        loop {
            match self.read_line(prompt)?.trim().parse::<i32>() {
                Ok(n) if n > 0 => return Ok(n),
                _ => self.say("Please enter a positive whole number.")?,
            }
        }
    }

    fn read_int_in_range(&mut self, min: i32, max: i32, prompt: &str) -> Result<i32, ConsoleError> {
        loop {
            match self.read_line(prompt)?.trim().parse::<i32>() {
                Ok(n) if (min..=max).contains(&n) => return Ok(n),
                _ => self.say(&format!("Please enter a number between {} and {}.", min, max))?,
            }
        }
    }

    /// Any non-empty line, trimmed.
    fn read_dynamic_string(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        loop {
            let line = self.read_line(prompt)?;
            let text = line.trim();
            if !text.is_empty() {
                return Ok(text.to_string());
            }
            self.say("This field cannot be empty.")?;
        }
    }

    /// At least 3 characters, leading uppercase, no digits.
    fn read_validated_name(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        loop {
            let name = self.read_dynamic_string(prompt)?;
            match validate_person_name(&name) {
                Ok(()) => return Ok(name),
                Err(e) => self.say(&format!("Rejected, {}.", e))?,
            }
        }
    }

    fn read_min_length(&mut self, min_chars: usize, prompt: &str) -> Result<String, ConsoleError> {
        loop {
            let text = self.read_dynamic_string(prompt)?;
            if text.chars().count() >= min_chars {
                return Ok(text);
            }
            self.say(&format!("Please enter at least {} characters.", min_chars))?;
        }
    }

    fn read_non_negative_amount(&mut self, prompt: &str) -> Result<f32, ConsoleError> {
        loop {
            match self.read_line(prompt)?.trim().replace(',', ".").parse::<f32>() {
                Ok(v) if v.is_finite() && v >= 0.0 => return Ok(v),
                _ => self.say("Please enter a non-negative amount.")?,
            }
        }
    }

    fn read_phone(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        loop {
            let phone = self.read_dynamic_string(prompt)?;
            if is_valid_phone(&phone) {
                return Ok(phone);
            }
            self.say("A phone number has exactly 9 digits.")?;
        }
    }

    fn read_email(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        loop {
            let email = self.read_dynamic_string(prompt)?;
            if is_valid_email(&email) {
                return Ok(email);
            }
            self.say("An e-mail needs exactly one '@' and at least one '.'.")?;
        }
    }

    /// `true` for yes. Accepts y/yes/s/sim and n/no/nao in any case.
    fn read_yes_no(&mut self, prompt: &str) -> Result<bool, ConsoleError> {
        loop {
            match self.read_line(prompt)?.trim().to_lowercase().as_str() {
                "y" | "yes" | "s" | "sim" => return Ok(true),
                "n" | "no" | "nao" | "não" => return Ok(false),
                _ => self.say("Please answer yes or no.")?,
            }
        }
    }

    /// Block until the user presses Enter.
    fn pause(&mut self) -> Result<(), ConsoleError> {
        self.read_line("Press Enter to continue...").map(|_| ())
    }
}

/// Prompter over any buffered reader and writer.
pub struct ConsolePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Prompter for ConsolePrompter<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        write!(self.output, "{} ", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ConsoleError::InputClosed);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    fn say(&mut self, text: &str) -> Result<(), ConsoleError> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }
}
