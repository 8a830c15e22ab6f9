use std::sync::Arc;

use ethers::{abi::Token, providers::Middleware, types::Address};

use crate::{
    artifacts::ContractArtifact,
    contracts::school_result::SchoolResult,
    deployer::deploy_contract,
    error::Result,
    gas_reporter::GasReporter,
    utils::format_address,
};

pub const DEPARTMENT_NAME: &str = "Computer Science";
pub const DEPARTMENT_CODE: &str = "CSC";
pub const STUDENT_NAME: &str = "Stephen";
pub const STUDENT_REG_NO: &str = "281278";
pub const STUDENT_DEPARTMENT_ID: u64 = 1;

pub struct SeededSchoolResult<M> {
    pub school_result: SchoolResult<M>,
    pub students: Token,
}

/// Deploys a fresh contract with `owner`, registers one department and enrols
/// both `other_account` and the owner in it, then reads back every student.
pub async fn deploy_seeded_school_result<M: Middleware + 'static>(
    artifact: &ContractArtifact,
    owner: Arc<M>,
    other_account: Address,
    gas_reporter: Arc<GasReporter>,
) -> Result<SeededSchoolResult<M>> {
    let deployment = deploy_contract(owner, artifact, &gas_reporter).await?;
    let owner_address = deployment.deployer;
    let school_result = SchoolResult::from_contract(deployment.contract, gas_reporter);

    tracing::info!(name = DEPARTMENT_NAME, code = DEPARTMENT_CODE, "adding department");
    school_result
        .add_department(DEPARTMENT_NAME, DEPARTMENT_CODE)
        .await?;

    for student in [other_account, owner_address] {
        tracing::info!(student = %format_address(&student), "adding student");
        school_result
            .add_student(
                student,
                STUDENT_NAME,
                STUDENT_REG_NO,
                STUDENT_DEPARTMENT_ID,
            )
            .await?;
    }

    let students = school_result.admin_get_all_students().await?;

    Ok(SeededSchoolResult {
        school_result,
        students,
    })
}
