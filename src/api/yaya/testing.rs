//! Scripted provider for exercising retry and routing behaviour in tests
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::models::ApiError;
use super::WalletProvider;

pub enum Step {
    Reply(Result<Value, ApiError>),
    /// Never completes
    Hang,
}

#[derive(Default)]
pub struct ScriptedProvider {
    list_steps: Mutex<VecDeque<Step>>,
    search_steps: Mutex<VecDeque<Step>>,
    time_steps: Mutex<VecDeque<Step>>,
    list_calls: AtomicU32,
    search_calls: AtomicU32,
    time_calls: AtomicU32,
    search_queries: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_list(self, step: Step) -> Self {
        self.list_steps.lock().unwrap().push_back(step);
        self
    }

    pub fn on_search(self, step: Step) -> Self {
        self.search_steps.lock().unwrap().push_back(step);
        self
    }

    pub fn on_time(self, step: Step) -> Self {
        self.time_steps.lock().unwrap().push_back(step);
        self
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> u32 {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn time_calls(&self) -> u32 {
        self.time_calls.load(Ordering::SeqCst)
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.search_queries.lock().unwrap().clone()
    }
}

async fn play(steps: &Mutex<VecDeque<Step>>) -> Result<Value, ApiError> {
    let step = steps.lock().unwrap().pop_front();
    match step {
        Some(Step::Reply(result)) => result,
        Some(Step::Hang) => std::future::pending().await,
        None => Err(ApiError::RequestError("no scripted response".to_string())),
    }
}

#[async_trait]
impl WalletProvider for ScriptedProvider {
    async fn list(&self, _page: u32) -> Result<Value, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        play(&self.list_steps).await
    }

    async fn search(&self, query: &str) -> Result<Value, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_queries.lock().unwrap().push(query.to_string());
        play(&self.search_steps).await
    }

    async fn server_time(&self) -> Result<Value, ApiError> {
        self.time_calls.fetch_add(1, Ordering::SeqCst);
        play(&self.time_steps).await
    }
}
