use std::sync::Arc;

use ethers::{
    abi::{Abi, Detokenize, Token, Tokenize},
    contract::{Contract, FunctionCall},
    providers::Middleware,
    types::{Address, TransactionReceipt, U256},
};

use crate::{
    error::{DeployerError, Result},
    gas_reporter::GasReporter,
};

pub const SCHOOL_RESULT: &str = "SchoolResult";

const ADD_DEPARTMENT: &str = "add_department";
const ADD_STUDENT: &str = "add_student";
const ADMIN_GET_ALL_STUDENTS: &str = "_adminGetAllStudents";

/// Handle to a deployed `SchoolResult` contract, bound to one client.
///
/// Calls are encoded against the ABI from the compiled artifact, so the
/// argument types are checked at call time rather than at build time.
pub struct SchoolResult<M> {
    contract: Contract<M>,
    gas_reporter: Arc<GasReporter>,
}

impl<M: Middleware + 'static> SchoolResult<M> {
    pub fn new(address: Address, abi: Abi, client: Arc<M>, gas_reporter: Arc<GasReporter>) -> Self {
        Self {
            contract: Contract::new(address, abi, client),
            gas_reporter,
        }
    }

    pub fn from_contract(contract: Contract<M>, gas_reporter: Arc<GasReporter>) -> Self {
        Self {
            contract,
            gas_reporter,
        }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    /// Same contract, calls sent from `client` instead.
    pub fn connect<N: Middleware + 'static>(&self, client: Arc<N>) -> SchoolResult<N> {
        SchoolResult::new(
            self.address(),
            self.contract.abi().clone(),
            client,
            self.gas_reporter.clone(),
        )
    }

    pub async fn add_department(&self, name: &str, code: &str) -> Result<TransactionReceipt> {
        let call = self.method(ADD_DEPARTMENT, (name.to_owned(), code.to_owned()))?;
        self.send(ADD_DEPARTMENT, call).await
    }

    pub async fn add_student(
        &self,
        student: Address,
        name: &str,
        reg_no: &str,
        department_id: u64,
    ) -> Result<TransactionReceipt> {
        let call = self.method(
            ADD_STUDENT,
            (
                student,
                name.to_owned(),
                reg_no.to_owned(),
                U256::from(department_id),
            ),
        )?;
        self.send(ADD_STUDENT, call).await
    }

    /// Every registered student, decoded as-is.
    pub async fn admin_get_all_students(&self) -> Result<Token> {
        self.method::<_, Token>(ADMIN_GET_ALL_STUDENTS, ())?
            .call()
            .await
            .map_err(|e| DeployerError::Contract(e.to_string()))
    }

    fn method<T: Tokenize, D: Detokenize>(
        &self,
        name: &str,
        args: T,
    ) -> Result<FunctionCall<Arc<M>, M, D>> {
        self.contract
            .method(name, args)
            .map_err(|e| DeployerError::Contract(format!("{name}: {e}")))
    }

    async fn send(
        &self,
        method: &str,
        call: FunctionCall<Arc<M>, M, ()>,
    ) -> Result<TransactionReceipt> {
        let pending = call
            .send()
            .await
            .map_err(|e| DeployerError::Contract(format!("{method}: {e}")))?;
        let tx_hash = pending.tx_hash();

        let receipt = pending
            .await
            .map_err(|e| DeployerError::Provider(e.to_string()))?
            .ok_or(DeployerError::TransactionDropped(tx_hash))?;

        if let Some(gas_used) = receipt.gas_used {
            self.gas_reporter
                .record_call(SCHOOL_RESULT, method, gas_used.low_u64());
        }
        tracing::debug!(method, tx = ?tx_hash, "transaction mined");

        Ok(receipt)
    }
}
