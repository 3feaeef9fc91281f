use serde_json::{Map, Value};

const LRN: &[&str] = &["lrn", "LRN", "learnerReferenceNumber"];
const FULL_NAME: &[&str] = &["fullName", "full_name", "name"];
const SURNAME: &[&str] = &["surname", "lastName"];
const GIVEN_NAME: &[&str] = &["givenName", "firstName"];
const MIDDLE_NAME: &[&str] = &["middleName"];
const EMAIL: &[&str] = &["email"];
const CONTACT: &[&str] = &["contact", "contactNo", "contact_number", "phone"];
const ADDRESS: &[&str] = &["address"];
const DOB: &[&str] = &["dob", "dateOfBirth", "birthDate"];
const POB: &[&str] = &["pob", "placeOfBirth"];
const SEX: &[&str] = &["sex"];
const NATIONALITY: &[&str] = &["nationality"];
const GRADE_LEVEL: &[&str] = &["gradeLevel", "grade_level", "grade"];
const STRAND: &[&str] = &["strand"];
const TRACK: &[&str] = &["track"];
const ACADEMIC_STRAND: &[&str] = &["academicStrand"];
const TVL_SPEC: &[&str] = &["tvlSpec", "trackSpecialization", "tvl_spec"];
const GENERAL_AVERAGE: &[&str] = &["generalAve", "generalAverage", "general_average"];
const MEDICAL_CONDITIONS: &[&str] = &[
    "medicalConditions",
    "medical_conditions",
    "medical[]",
    "medical",
];
const MEDICAL_OTHER: &[&str] = &["medicalOther"];
const HOW_SUPPORTED: &[&str] = &["howSupported"];
const GUARDIAN_NAME: &[&str] = &["guardianName"];
const GUARDIAN_RELATIONSHIP: &[&str] = &["guardianRelationship", "relationship"];
const GUARDIAN_OCCUPATION: &[&str] = &["guardianOccupation", "occupation"];
const GUARDIAN_TELEPHONE: &[&str] = &["telNo", "guardianTelNo", "telephone"];
const GUARDIAN_CELLPHONE: &[&str] = &["cellphoneNo", "guardianCellphoneNo", "cellphone"];
const JHS_GRADUATED: &[&str] = &["jhsGraduated"];
const GRADUATION_DATE: &[&str] = &["dateGraduation", "graduationDate"];
const CREDENTIALS_SUBMITTED: &[&str] = &["credentialsSubmitted"];
const SIGNATURE: &[&str] = &["signature"];

const EMPTY_LITERALS: [&str; 3] = ["none", "null", "undefined"];

/// Canonical field set of one enrollment submission, after alias
/// resolution and cleaning. Absent and blank values are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrollmentFields {
    pub lrn: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub dob: Option<String>,
    pub pob: Option<String>,
    pub sex: Option<String>,
    pub nationality: Option<String>,
    pub grade_level: Option<String>,
    pub strand: Option<String>,
    pub tvl_spec: Option<String>,
    pub general_average: Option<String>,
    pub medical_conditions: Vec<String>,
    pub medical_other: Option<String>,
    pub how_supported: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_relationship: Option<String>,
    pub guardian_occupation: Option<String>,
    pub guardian_telephone: Option<String>,
    pub guardian_cellphone: Option<String>,
    pub jhs_graduated: Option<String>,
    pub graduation_date: Option<String>,
    pub credentials_submitted: Option<String>,
    pub signature: Option<String>,
}

/// Trims a scalar and maps blank values and the "none"/"null"/"undefined"
/// literals to `None`. Arrays and objects are not scalars.
pub fn clean_scalar(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    if raw.is_empty()
        || EMPTY_LITERALS
            .iter()
            .any(|literal| raw.eq_ignore_ascii_case(literal))
    {
        None
    } else {
        Some(raw)
    }
}

fn pick(payload: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|key| payload.get(*key))
        .find_map(clean_scalar)
}

/// Like `pick`, but a list of scalars is kept as one comma-separated value.
fn pick_text(payload: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|key| payload.get(*key))
        .find_map(|value| match value {
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().filter_map(clean_scalar).collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }
            scalar => clean_scalar(scalar),
        })
}

fn pick_list(payload: &Map<String, Value>, aliases: &[&str]) -> Vec<String> {
    for key in aliases {
        let items: Vec<String> = match payload.get(*key) {
            Some(Value::Array(values)) => values.iter().filter_map(clean_scalar).collect(),
            Some(scalar) => clean_scalar(scalar).into_iter().collect(),
            None => continue,
        };
        if !items.is_empty() {
            return items;
        }
    }
    Vec::new()
}

fn derive_full_name(payload: &Map<String, Value>) -> Option<String> {
    let parts: Vec<String> = [SURNAME, GIVEN_NAME, MIDDLE_NAME]
        .iter()
        .filter_map(|aliases| pick(payload, aliases))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn derive_strand(payload: &Map<String, Value>) -> Option<String> {
    let track = pick(payload, TRACK)?;
    if track.eq_ignore_ascii_case("TVL Track") {
        Some("TVL".to_string())
    } else if track.eq_ignore_ascii_case("Academic Track") {
        pick(payload, ACADEMIC_STRAND)
    } else {
        None
    }
}

/// Resolves a raw submission into the canonical field set. Any `status`
/// key in the payload is ignored.
pub fn normalize_enrollment(payload: &Map<String, Value>) -> EnrollmentFields {
    EnrollmentFields {
        lrn: pick(payload, LRN),
        full_name: pick(payload, FULL_NAME).or_else(|| derive_full_name(payload)),
        email: pick(payload, EMAIL),
        contact: pick(payload, CONTACT),
        address: pick(payload, ADDRESS),
        dob: pick(payload, DOB),
        pob: pick(payload, POB),
        sex: pick(payload, SEX),
        nationality: pick(payload, NATIONALITY),
        grade_level: pick(payload, GRADE_LEVEL),
        strand: pick(payload, STRAND).or_else(|| derive_strand(payload)),
        tvl_spec: pick(payload, TVL_SPEC),
        general_average: pick(payload, GENERAL_AVERAGE),
        medical_conditions: pick_list(payload, MEDICAL_CONDITIONS),
        medical_other: pick_text(payload, MEDICAL_OTHER),
        how_supported: pick_text(payload, HOW_SUPPORTED),
        guardian_name: pick(payload, GUARDIAN_NAME),
        guardian_relationship: pick(payload, GUARDIAN_RELATIONSHIP),
        guardian_occupation: pick(payload, GUARDIAN_OCCUPATION),
        guardian_telephone: pick(payload, GUARDIAN_TELEPHONE),
        guardian_cellphone: pick(payload, GUARDIAN_CELLPHONE),
        jhs_graduated: pick(payload, JHS_GRADUATED),
        graduation_date: pick(payload, GRADUATION_DATE),
        credentials_submitted: pick_text(payload, CREDENTIALS_SUBMITTED),
        signature: pick(payload, SIGNATURE),
    }
}
