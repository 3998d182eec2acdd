use crate::generator::random::{build_scenario, GeneratorConfig};
use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::runner::{RunResult, Runner};
use anyhow::{anyhow, Result};
use dopplercore::interface::Scenario;
use log::{error, info};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

pub fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct BridgeError;

impl warp::reject::Reject for BridgeError {}

type SharedModel = Arc<RwLock<VisualizationModel>>;

fn store(state: &SharedModel, model: VisualizationModel) {
    match state.write() {
        Ok(mut guard) => *guard = model,
        Err(_) => error!("visualization model lock poisoned; dropping update"),
    }
}

fn run_reply(
    state: &SharedModel,
    result: &RunResult,
) -> warp::reply::WithStatus<warp::reply::Json> {
    store(state, VisualizationModel::from(result));
    warp::reply::with_status(
        warp::reply::json(&json!({
            "status": "ok",
            "scenario": result.name.clone().unwrap_or_default(),
            "frames": result.frames,
            "wavefronts": result.snapshot.wavefront_count(),
        })),
        StatusCode::OK,
    )
}

/// Runs a scenario on the blocking pool so the bridge keeps serving `/snapshot`.
async fn execute_blocking(runner: Arc<Runner>, scenario: Scenario) -> Result<RunResult> {
    tokio::task::spawn_blocking(move || runner.execute(&scenario))
        .await
        .map_err(|err| anyhow!("scenario task failed: {}", err))?
}

/// HTTP bridge that serves the latest run and accepts scenarios to run.
pub struct GuiBridge {
    state: SharedModel,
    runner: Arc<Runner>,
}

impl GuiBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            state: Arc::new(RwLock::new(VisualizationModel::default())),
            runner,
        }
    }

    /// Starts the HTTP endpoint on its own thread.
    pub fn serve(&self, address: SocketAddr) {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());

        let snapshot_route = warp::path("snapshot")
            .and(warp::path::end())
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| {
                let model = state
                    .read()
                    .map(|guard| guard.clone())
                    .unwrap_or_default();
                warp::reply::json(&model)
            });

        let scenario_route = warp::path("scenario")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter.clone())
            .and(runner_filter.clone())
            .and_then(
                |scenario: Scenario, state: SharedModel, runner: Arc<Runner>| async move {
                    match execute_blocking(runner, scenario).await {
                        Ok(result) => Ok::<_, warp::Rejection>(run_reply(&state, &result)),
                        Err(err) => {
                            error!("scenario error: {:#}", err);
                            Err(warp::reject::custom(BridgeError))
                        }
                    }
                },
            );

        let generate_route = warp::path("generate")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |config: GeneratorConfig, state: SharedModel, runner: Arc<Runner>| async move {
                    let outcome = match build_scenario(&config) {
                        Ok(scenario) => execute_blocking(runner, scenario).await,
                        Err(err) => Err(err),
                    };
                    match outcome {
                        Ok(result) => {
                            info!(
                                "generated scenario seed {} -> {} wavefronts",
                                config.seed,
                                result.snapshot.wavefront_count()
                            );
                            Ok::<_, warp::Rejection>(run_reply(&state, &result))
                        }
                        Err(err) => {
                            error!("generate error: {:#}", err);
                            Err(warp::reject::custom(BridgeError))
                        }
                    }
                },
            );

        thread::spawn(move || {
            let routes = snapshot_route.or(scenario_route).or(generate_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            info!("bridge listening on http://{}", address);
            runtime.block_on(async move {
                warp::serve(routes).run(address).await;
            });
        });
    }

    pub fn publish(&self, model: &VisualizationModel) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| anyhow!("visualization model lock poisoned"))?;
        *guard = model.clone();
        info!(
            "published {} objects, {} wavefronts, {} probes",
            guard.snapshot.objects.len(),
            guard.snapshot.wavefront_count(),
            guard.probes.len()
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        println!("[bridge] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> VisualizationModel {
        self.state
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}
