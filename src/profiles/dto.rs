use serde::Deserialize;

/// Patient profile form. Dates arrive as `YYYY-MM-DD`, gender as `M`/`F`/`O`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PatientProfileForm {
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DoctorProfileForm {
    pub specialization: String,
    pub qualification: String,
    pub experience_years: Option<i64>,
}
