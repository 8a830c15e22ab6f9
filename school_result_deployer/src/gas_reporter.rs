use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    sync::Mutex,
};

use crate::config::GasReporterConfig;

const GWEI_PER_TOKEN: f64 = 1_000_000_000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct GasStats {
    calls: u64,
    min: u64,
    max: u64,
    total: u64,
}

impl GasStats {
    fn record(&mut self, gas: u64) {
        if self.calls == 0 {
            self.min = gas;
            self.max = gas;
        } else {
            self.min = self.min.min(gas);
            self.max = self.max.max(gas);
        }
        self.calls += 1;
        self.total += gas;
    }

    fn avg(&self) -> u64 {
        match self.calls {
            0 => 0,
            calls => self.total / calls,
        }
    }
}

/// Collects gas used by deployments and transactions sent through this crate.
pub struct GasReporter {
    config: GasReporterConfig,
    methods: Mutex<BTreeMap<(String, String), GasStats>>,
    deployments: Mutex<BTreeMap<String, GasStats>>,
}

impl GasReporter {
    pub fn new(config: GasReporterConfig) -> Self {
        Self {
            config,
            methods: Mutex::default(),
            deployments: Mutex::default(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(GasReporterConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn record_deployment(&self, contract: &str, gas_used: u64) {
        if !self.config.enabled {
            return;
        }
        let mut deployments = self.deployments.lock().unwrap_or_else(|e| e.into_inner());
        deployments
            .entry(contract.to_owned())
            .or_default()
            .record(gas_used);
    }

    pub fn record_call(&self, contract: &str, method: &str, gas_used: u64) {
        if !self.config.enabled {
            return;
        }
        let mut methods = self.methods.lock().unwrap_or_else(|e| e.into_inner());
        methods
            .entry((contract.to_owned(), method.to_owned()))
            .or_default()
            .record(gas_used);
    }

    pub fn report(&self) -> GasReport {
        let methods = self.methods.lock().unwrap_or_else(|e| e.into_inner());
        let deployments = self.deployments.lock().unwrap_or_else(|e| e.into_inner());

        let methods = methods
            .iter()
            .map(|((contract, method), stats)| self.row(contract, Some(method), stats))
            .collect();
        let deployments = deployments
            .iter()
            .map(|(contract, stats)| self.row(contract, None, stats))
            .collect();

        GasReport {
            currency: self.config.currency.clone(),
            gas_price_gwei: self.config.gas_price,
            methods,
            deployments,
        }
    }

    fn row(&self, contract: &str, method: Option<&str>, stats: &GasStats) -> GasReportRow {
        let avg = stats.avg();
        let native_cost = self
            .config
            .gas_price
            .map(|gwei| avg as f64 * gwei as f64 / GWEI_PER_TOKEN);
        let fiat_cost = native_cost.zip(self.config.token_price).map(|(n, p)| n * p);

        GasReportRow {
            contract: contract.to_owned(),
            method: method.map(str::to_owned),
            calls: stats.calls,
            min: stats.min,
            max: stats.max,
            avg,
            native_cost,
            fiat_cost,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GasReportRow {
    pub contract: String,
    /// None for deployments.
    pub method: Option<String>,
    pub calls: u64,
    pub min: u64,
    pub max: u64,
    pub avg: u64,
    /// Cost of an average call in the native token.
    pub native_cost: Option<f64>,
    pub fiat_cost: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GasReport {
    pub currency: String,
    pub gas_price_gwei: Option<u64>,
    pub methods: Vec<GasReportRow>,
    pub deployments: Vec<GasReportRow>,
}

impl GasReport {
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.deployments.is_empty()
    }
}

impl Display for GasReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let gas_price = match self.gas_price_gwei {
            Some(gwei) => format!("{gwei} gwei/gas"),
            None => String::from("gas price not set"),
        };
        writeln!(f, "Gas usage ({gas_price}, currency {})", self.currency)?;

        let header = format!(
            "{:<20} {:<24} {:>6} {:>10} {:>10} {:>10} {:>12} {:>12}",
            "Contract",
            "Method",
            "Calls",
            "Min",
            "Max",
            "Avg",
            "Cost",
            self.currency
        );
        writeln!(f, "{header}")?;
        writeln!(f, "{}", "-".repeat(header.len()))?;

        for row in self.methods.iter().chain(&self.deployments) {
            let method = row.method.as_deref().unwrap_or("(deployment)");
            let native = row
                .native_cost
                .map(|c| format!("{c:.6}"))
                .unwrap_or_else(|| String::from("-"));
            let fiat = row
                .fiat_cost
                .map(|c| format!("{c:.2}"))
                .unwrap_or_else(|| String::from("-"));
            writeln!(
                f,
                "{:<20} {:<24} {:>6} {:>10} {:>10} {:>10} {:>12} {:>12}",
                row.contract, method, row.calls, row.min, row.max, row.avg, native, fiat
            )?;
        }

        Ok(())
    }
}
