//! Benefit application form and submission
//!
//! The form is collected in three steps (personal, medical, financial) and
//! sent as one multipart request.

use chrono::{NaiveDate, Utc};
use log::info;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::identity::Identifier;

/// Steps of the application wizard, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStep {
    Personal,
    Medical,
    Financial,
}

impl FormStep {
    pub const ALL: [FormStep; 3] = [FormStep::Personal, FormStep::Medical, FormStep::Financial];

    /// The step after this one, if any
    pub fn next(&self) -> Option<FormStep> {
        match self {
            FormStep::Personal => Some(FormStep::Medical),
            FormStep::Medical => Some(FormStep::Financial),
            FormStep::Financial => None,
        }
    }
}

/// An uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// A PDF attachment
    pub fn pdf(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: "application/pdf".to_string(),
            bytes,
        }
    }

    /// Read an attachment from disk, guessing the content type from the extension
    pub async fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
            Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
            Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
                "image/jpeg"
            }
            _ => "application/octet-stream",
        };
        Ok(Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        })
    }

    fn into_part(self) -> Result<multipart::Part> {
        multipart::Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)
            .map_err(Error::from)
    }
}

/// Everything the wizard collects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitApplicationForm {
    // personal
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub social_security_number: String,

    // medical
    pub doctor_names: String,
    pub hospital_names: String,
    pub medical_records_permission: bool,
    #[serde(skip)]
    pub medical_records_file: Option<Attachment>,

    // financial
    #[serde(skip)]
    pub income_documents_file: Option<Attachment>,
}

fn required(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::invalid_input(format!("{field} is required")))
    } else {
        Ok(())
    }
}

impl BenefitApplicationForm {
    /// Check the fields belonging to one step
    pub fn validate_step(&self, step: FormStep) -> Result<()> {
        match step {
            FormStep::Personal => {
                required(&self.first_name, "first name")?;
                required(&self.last_name, "last name")?;
                required(&self.address, "address")?;
                required(&self.city, "city")?;
                required(&self.state, "state")?;

                let dob = NaiveDate::parse_from_str(self.date_of_birth.trim(), "%Y-%m-%d")
                    .map_err(|_| Error::invalid_input("date of birth must be YYYY-MM-DD"))?;
                if dob >= Utc::now().date_naive() {
                    return Err(Error::invalid_input("date of birth must be in the past"));
                }

                let zip = self.zip_code.trim();
                if zip.len() != 5 || !zip.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(Error::invalid_input("zip code must be 5 digits"));
                }
                if !Identifier::is_complete(&self.social_security_number) {
                    return Err(Error::invalid_input("social security number must have 9 digits"));
                }
                Ok(())
            }
            FormStep::Medical => {
                required(&self.doctor_names, "doctor names")?;
                required(&self.hospital_names, "hospital names")?;
                if !self.medical_records_permission {
                    return Err(Error::invalid_input(
                        "permission to request medical records is required",
                    ));
                }
                Ok(())
            }
            FormStep::Financial => Ok(()),
        }
    }

    /// Check every step, stopping at the first failure
    pub fn validate(&self) -> Result<()> {
        FormStep::ALL
            .iter()
            .try_for_each(|step| self.validate_step(*step))
    }

    fn into_multipart(self) -> Result<multipart::Form> {
        let mut form = multipart::Form::new()
            .text("firstName", self.first_name.trim().to_string())
            .text("lastName", self.last_name.trim().to_string())
            .text("dateOfBirth", self.date_of_birth.trim().to_string())
            .text("address", self.address.trim().to_string())
            .text("city", self.city.trim().to_string())
            .text("state", self.state.trim().to_string())
            .text("zipCode", self.zip_code.trim().to_string())
            .text(
                "socialSecurityNumber",
                Identifier::display(&self.social_security_number),
            )
            .text("doctorNames", self.doctor_names.trim().to_string())
            .text("hospitalNames", self.hospital_names.trim().to_string())
            .text(
                "medicalRecordsPermission",
                self.medical_records_permission.to_string(),
            );

        if let Some(file) = self.medical_records_file {
            form = form.part("medicalRecordsFile", file.into_part()?);
        }
        if let Some(file) = self.income_documents_file {
            form = form.part("incomeDocumentsFile", file.into_part()?);
        }
        Ok(form)
    }
}

/// What the service returns for an accepted submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub estimated_processing_time: Option<String>,
}

/// `GET /api/health` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Client for form submission
pub struct SubmissionClient {
    url: String,
    client: Client,
    options: ClientOptions,
}

impl SubmissionClient {
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
        }
    }

    /// Validate and submit the form
    pub async fn submit(
        &self,
        form: BenefitApplicationForm,
        cancel: Option<&CancellationToken>,
    ) -> Result<SubmissionReceipt> {
        form.validate()?;
        let applicant = format!("{} {}", form.first_name.trim(), form.last_name.trim());

        let url = format!("{}/api/benefit-application", self.url);
        let receipt = Fetch::post(&self.client, &url)
            .multipart(form.into_multipart()?)
            .timeout(self.options.request_timeout)
            .cancel_on(cancel)
            .execute::<SubmissionReceipt>()
            .await?;

        if !receipt.success {
            return Err(Error::general(if receipt.message.is_empty() {
                "application was not accepted".to_string()
            } else {
                receipt.message
            }));
        }
        info!("application submitted for {}", applicant);
        Ok(receipt)
    }

    /// Probe the service
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/api/health", self.url);
        Fetch::get(&self.client, &url)
            .timeout(self.options.request_timeout)
            .execute::<HealthStatus>()
            .await
    }
}
