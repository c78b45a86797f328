use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{DEFAULT_TAX_YEAR, Disability, Inputs, Parent, Rates, SplitReport, solve};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliDisability {
    None,
    Partial,
    Full,
}

impl From<CliDisability> for Disability {
    fn from(value: CliDisability) -> Self {
        match value {
            CliDisability::None => Disability::None,
            CliDisability::Partial => Disability::Partial,
            CliDisability::Full => Disability::Full,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiDisability {
    None,
    Partial,
    Full,
}

impl From<ApiDisability> for CliDisability {
    fn from(value: ApiDisability) -> Self {
        match value {
            ApiDisability::None => CliDisability::None,
            ApiDisability::Partial => CliDisability::Partial,
            ApiDisability::Full => CliDisability::Full,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SolvePayload {
    parent_a_income: Option<f64>,
    parent_a_tax_paid: Option<f64>,
    parent_a_birth_year: Option<i32>,
    parent_a_disability: Option<ApiDisability>,

    parent_b_income: Option<f64>,
    parent_b_tax_paid: Option<f64>,
    parent_b_birth_year: Option<i32>,
    parent_b_disability: Option<ApiDisability>,

    lower_rate: Option<f64>,
    higher_rate: Option<f64>,
    children: Option<u32>,
    dependents: Option<u32>,
    tax_year: Option<i32>,
}

#[derive(Parser, Debug)]
#[command(
    name = "smartzpp",
    about = "Split the dependent allowance between two parents to minimise household tax"
)]
struct Cli {
    #[arg(long)]
    parent_a_income: f64,
    #[arg(long, default_value_t = 0.0, help = "Tax parent A already paid this year")]
    parent_a_tax_paid: f64,
    #[arg(long)]
    parent_a_birth_year: i32,
    #[arg(long, value_enum, default_value_t = CliDisability::None)]
    parent_a_disability: CliDisability,
    #[arg(long)]
    parent_b_income: f64,
    #[arg(long, default_value_t = 0.0, help = "Tax parent B already paid this year")]
    parent_b_tax_paid: f64,
    #[arg(long)]
    parent_b_birth_year: i32,
    #[arg(long, value_enum, default_value_t = CliDisability::None)]
    parent_b_disability: CliDisability,
    #[arg(long, default_value_t = 20.0, help = "Lower bracket rate in percent")]
    lower_rate: f64,
    #[arg(long, default_value_t = 30.0, help = "Higher bracket rate in percent")]
    higher_rate: f64,
    #[arg(long, default_value_t = 0)]
    children: u32,
    #[arg(long, default_value_t = 0, help = "Dependents other than children")]
    dependents: u32,
    #[arg(long, default_value_t = DEFAULT_TAX_YEAR)]
    tax_year: i32,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: Cli) -> Result<Inputs, String> {
    let inputs = Inputs {
        parent_a: Parent {
            income_annual: cli.parent_a_income,
            tax_paid: cli.parent_a_tax_paid,
            birth_year: cli.parent_a_birth_year,
            disability: cli.parent_a_disability.into(),
        },
        parent_b: Parent {
            income_annual: cli.parent_b_income,
            tax_paid: cli.parent_b_tax_paid,
            birth_year: cli.parent_b_birth_year,
            disability: cli.parent_b_disability.into(),
        },
        rates: Rates {
            lower: cli.lower_rate / 100.0,
            higher: cli.higher_rate / 100.0,
        },
        child_count: cli.children,
        dependent_count: cli.dependents,
        tax_year: cli.tax_year,
    };
    inputs.validate().map_err(|e| e.to_string())?;
    Ok(inputs)
}

pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let inputs = build_inputs(cli)?;
    let report = solve(&inputs);
    serde_json::to_string_pretty(&report).map_err(|e| format!("Failed to encode report: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/solve", get(solve_get_handler).post(solve_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("smartzpp HTTP API listening on http://{addr}");
    println!("Try: http://127.0.0.1:{port}/api/solve?children=2");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn solve_get_handler(payload: Result<Query<SolvePayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => solve_handler_impl(payload),
        Err(rejection) => bad_request(&rejection.body_text()),
    }
}

async fn solve_post_handler(payload: Result<Json<SolvePayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => solve_handler_impl(payload),
        Err(rejection) => bad_request(&rejection.body_text()),
    }
}

fn solve_handler_impl(payload: SolvePayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return bad_request(&msg),
    };

    let report: SplitReport = solve(&inputs);
    json_response(StatusCode::OK, report)
}

fn bad_request(msg: &str) -> Response {
    log::warn!("rejected solve request: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<Inputs, String> {
    let payload = serde_json::from_str::<SolvePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}

fn inputs_from_payload(payload: SolvePayload) -> Result<Inputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.parent_a_income {
        cli.parent_a_income = v;
    }
    if let Some(v) = payload.parent_a_tax_paid {
        cli.parent_a_tax_paid = v;
    }
    if let Some(v) = payload.parent_a_birth_year {
        cli.parent_a_birth_year = v;
    }
    if let Some(v) = payload.parent_a_disability {
        cli.parent_a_disability = v.into();
    }

    if let Some(v) = payload.parent_b_income {
        cli.parent_b_income = v;
    }
    if let Some(v) = payload.parent_b_tax_paid {
        cli.parent_b_tax_paid = v;
    }
    if let Some(v) = payload.parent_b_birth_year {
        cli.parent_b_birth_year = v;
    }
    if let Some(v) = payload.parent_b_disability {
        cli.parent_b_disability = v.into();
    }

    if let Some(v) = payload.lower_rate {
        cli.lower_rate = v;
    }
    if let Some(v) = payload.higher_rate {
        cli.higher_rate = v;
    }
    if let Some(v) = payload.children {
        cli.children = v;
    }
    if let Some(v) = payload.dependents {
        cli.dependents = v;
    }
    if let Some(v) = payload.tax_year {
        cli.tax_year = v;
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        parent_a_income: 36_000.0,
        parent_a_tax_paid: 0.0,
        parent_a_birth_year: 1987,
        parent_a_disability: CliDisability::None,
        parent_b_income: 24_000.0,
        parent_b_tax_paid: 0.0,
        parent_b_birth_year: 1989,
        parent_b_disability: CliDisability::None,
        lower_rate: 20.0,
        higher_rate: 30.0,
        children: 1,
        dependents: 0,
        tax_year: DEFAULT_TAX_YEAR,
    }
}
