// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Step machines for the multi-step feature flows.
//!
//! A wizard moves forward one step at a time, allows a single back
//! transition where the flow defines one, and can be reset. Work started for
//! a step is held as a [`Task`] and aborted on back, reset or drop.

use crate::error::ValidationError;
use crate::services::task::{Task, TaskError};
use serde::Serialize;
use std::fmt::Debug;

pub trait WizardStep: Copy + Eq + Debug {
    const FIRST: Self;

    fn next(self) -> Option<Self>;

    /// The step a back transition returns to, if this step allows one.
    fn prev(self) -> Option<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosisStep {
    Symptoms,
    FollowUp,
    Results,
}

impl WizardStep for DiagnosisStep {
    const FIRST: Self = Self::Symptoms;

    fn next(self) -> Option<Self> {
        match self {
            Self::Symptoms => Some(Self::FollowUp),
            Self::FollowUp => Some(Self::Results),
            Self::Results => None,
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            Self::FollowUp => Some(Self::Symptoms),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrugStep {
    Input,
    Generating,
    Results,
}

impl WizardStep for DrugStep {
    const FIRST: Self = Self::Input;

    fn next(self) -> Option<Self> {
        match self {
            Self::Input => Some(Self::Generating),
            Self::Generating => Some(Self::Results),
            Self::Results => None,
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            Self::Generating => Some(Self::Input),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageStep {
    Upload,
    Preview,
    Results,
}

impl WizardStep for ImageStep {
    const FIRST: Self = Self::Upload;

    fn next(self) -> Option<Self> {
        match self {
            Self::Upload => Some(Self::Preview),
            Self::Preview => Some(Self::Results),
            Self::Results => None,
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            Self::Preview => Some(Self::Upload),
            _ => None,
        }
    }
}

pub struct Wizard<S: WizardStep, T: Send + 'static> {
    step: S,
    in_flight: Option<Task<T>>,
}

impl<S: WizardStep, T: Send + 'static> Default for Wizard<S, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: WizardStep, T: Send + 'static> Wizard<S, T> {
    pub fn new() -> Self {
        Self {
            step: S::FIRST,
            in_flight: None,
        }
    }

    pub fn step(&self) -> S {
        self.step
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Move to the next step.
    pub fn advance(&mut self) -> Result<S, ValidationError> {
        let next = self.step.next().ok_or_else(|| {
            ValidationError::new(format!("Cannot advance past {:?}", self.step))
        })?;
        self.step = next;
        Ok(next)
    }

    /// Return to the previous step, aborting in-flight work.
    pub fn back(&mut self) -> Result<S, ValidationError> {
        let prev = self
            .step
            .prev()
            .ok_or_else(|| ValidationError::new(format!("Cannot go back from {:?}", self.step)))?;
        self.cancel();
        self.step = prev;
        Ok(prev)
    }

    /// Return to the first step, aborting in-flight work.
    pub fn reset(&mut self) {
        self.cancel();
        self.step = S::FIRST;
    }

    /// Start work for the current step. Any previous work is aborted.
    pub fn start(&mut self, task: Task<T>) {
        self.cancel();
        self.in_flight = Some(task);
    }

    /// Wait for the in-flight work and advance on success.
    pub async fn complete(&mut self, limit: std::time::Duration) -> Result<T, TaskError> {
        let task = self.in_flight.take().ok_or(TaskError::Cancelled)?;
        let value = task.join_timeout(limit).await?;
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(value)
    }

    fn cancel(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

impl<S: WizardStep, T: Send + 'static> Drop for Wizard<S, T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
