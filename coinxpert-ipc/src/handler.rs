use anyhow::Result;
use serde::Serialize;
use serde_json::json;

use coinxpert_common::comparison::{ComparisonHarness, ComparisonRecord};
use coinxpert_common::config::Config;
use coinxpert_common::logging::{self, LogLevel};
use coinxpert_common::utxo_selection::SelectionParams;

use crate::messages::{
    ErrorResponse, SelectionRequest, SelectionResponse, INSUFFICIENT_BALANCE, STATUS_BAD_REQUEST,
    STATUS_INTERNAL_ERROR, STATUS_OK, STATUS_UNPROCESSABLE,
};

/// Serves selection requests by running both strategies on every request
pub struct RequestHandler {
    harness: ComparisonHarness,
    params: SelectionParams,
}

impl RequestHandler {
    pub fn new(harness: ComparisonHarness, params: SelectionParams) -> Self {
        Self { harness, params }
    }

    /// Build a handler from validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let params = config.selection.to_params()?;
        let harness = ComparisonHarness::new().parallel(config.comparison.parallel);
        Ok(Self::new(harness, params))
    }

    pub fn params(&self) -> &SelectionParams {
        &self.params
    }

    /// Handle a decoded request
    ///
    /// Invalid amounts map to 422. If either strategy cannot fund the payment
    /// the request fails with 400 and the error carries whatever the other
    /// strategy found.
    pub fn handle(&self, request: &SelectionRequest) -> Result<SelectionResponse, ErrorResponse> {
        let utxos = request.to_utxos()?;
        let target = request.target_amount()?;

        let record = self.harness.compare(&utxos, target, &self.params)?;
        let response = SelectionResponse::from_results(&record.reference, &record.alternative);

        if let Some(strategy) = first_infeasible(&record) {
            logging::log_boundary(
                LogLevel::Warn,
                "selection_infeasible",
                Some(json!({
                    "strategy": strategy,
                    "utxos": utxos.len(),
                    "target": target.to_sat(),
                })),
            );
            return Err(ErrorResponse::new(
                STATUS_BAD_REQUEST,
                format!("{} ({})", INSUFFICIENT_BALANCE, strategy),
            )
            .with_partial(response));
        }

        Ok(response)
    }

    /// Handle a raw JSON body, returning the status code and the JSON reply
    pub fn handle_json(&self, body: &str) -> (u16, String) {
        let outcome = serde_json::from_str::<SelectionRequest>(body)
            .map_err(|e| {
                ErrorResponse::new(STATUS_UNPROCESSABLE, format!("Invalid request body: {}", e))
            })
            .and_then(|request| self.handle(&request));

        let (status, reply) = match outcome {
            Ok(response) => encode(STATUS_OK, &response),
            Err(error) => encode(error.status, &error),
        };

        logging::log_boundary(
            if status == STATUS_OK {
                LogLevel::Debug
            } else {
                LogLevel::Info
            },
            "request_handled",
            Some(logging::log_params(vec![("status", status.to_string())])),
        );

        (status, reply)
    }
}

fn first_infeasible(record: &ComparisonRecord) -> Option<&str> {
    [&record.reference, &record.alternative]
        .into_iter()
        .find(|result| !result.is_feasible())
        .map(|result| result.strategy_name.as_str())
}

fn encode<T: Serialize>(status: u16, body: &T) -> (u16, String) {
    match serde_json::to_string(body) {
        Ok(json) => (status, json),
        Err(e) => (
            STATUS_INTERNAL_ERROR,
            json!({ "status": STATUS_INTERNAL_ERROR, "detail": e.to_string() }).to_string(),
        ),
    }
}
