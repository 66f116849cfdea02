use super::contains_any;

pub const UNKNOWN: &str = "unknown";
pub const OTHER: &str = "other";

/// Ordered job-function rules: executive titles first, then specific functions,
/// then broad management words, then short ambiguous abbreviations.
///
/// Keyword sets overlap on purpose. A title is claimed by the first rule that
/// matches and is never reconsidered by a later, more general one.
const JOB_FUNCTION_RULES: &[(&[&str], &str)] = &[
    (
        &[
            "chief compliance officer", "chief legal officer", "chief privacy officer",
            "chief risk officer", "chief sustainability officer",
        ],
        "legal_risk_compliance",
    ),
    (
        &[
            "chief brand officer", "chief communications officer", "chief content officer",
            "chief creative officer", "chief design officer", "chief marketing officer",
            "chief reputation officer",
        ],
        "marketing_creative",
    ),
    (
        &[
            "chief administrative officer", "chief operating officer", "chief process officer",
            "chief restructuring officer", "chief services officer", "chief visibility officer",
        ],
        "operations",
    ),
    (
        &[
            "chief customer officer", "chief experience officer", "chief innovation officer",
            "chief product officer",
        ],
        "product_experience",
    ),
    (
        &[
            "chief business development officer", "chief commercial officer",
            "chief growth officer", "chief revenue officer",
        ],
        "sales_business_development",
    ),
    (
        &[
            "chief analytics officer", "chief data officer", "chief genealogical officer",
            "chief research officer", "chief scientific officer",
        ],
        "science_data",
    ),
    (&["chief security officer"], "security"),
    (&["chief supply chain officer"], "supply_chain"),
    (&["chief quality officer"], "quality_assurance"),
    (
        &[
            "chief confluence officer", "chief digital officer", "chief information officer",
            "chief information security officer", "chief solutions officer",
            "chief technical officer", "chief technology officer",
            "chief technology security officer", "chief web officer",
        ],
        "engineering",
    ),
    (&["chief financial officer", "chief investment officer"], "finance_accounting"),
    (
        &[
            "executive", "partner", "principal", "chief business officer",
            "chief executive officer", "chief strategy officer", "chief visionary officer",
            "chief innovation officer", "chief product officer",
        ],
        "general_management",
    ),
    (
        &[
            "chief diversity officer", "chief human resources officer",
            "chief learning officer", "chief people officer",
        ],
        "human_resources_hr",
    ),
    (&["data scientist", "data science", "predictive modeler"], "data_scientist"),
    (&["attorney", "lawyer", "counsel", "litigation", "negotiator"], "legal_attorney_counsel"),
    (&["legal", "paralegal", "reviewer", "court reporter"], "legal_support"),
    (
        &[
            "scientist", "research", "chemist", "biologist", "ecologist", "geophysicist",
            "mathematician", "lab", "laboratory", "math", "fish",
        ],
        "science_research",
    ),
    (&["quality assurance", "quality control", "tester", "auditor"], "quality_assurance"),
    (
        &[
            "administrator", "architect", "code", "coding", "cyber security", "data modeler",
            "developer", "engineer", "information technology", "programmer", "scrum master",
            "sdet", "sre", "webmaster", "wordpress", "hadoop", "jira", "netbackup", "sap",
            "sharepoint", "ucce", "workday", "data validator", "frontend", "front end",
            "database", "nuclear",
        ],
        "engineering_it",
    ),
    (
        &[
            "surgeon", "cardiologist", "dermatologist", "neurologist", "oncology",
            "radiologist", "anesthesiologist", "pathologist", "medical director", "ob/gyn",
            "obgyn", "surgery", "pediatric", "cardiovascular", "neuroscience", "neurosurgery",
            "endoscopy", "endodontist", "radiology", "vascular", "urology", "physiatrist",
        ],
        "healthcare_specialist_physician",
    ),
    (
        &[
            "physician", "doctor", "veterinarian", "psychiatrist", "dentist", "orthodontist",
            "resident",
        ],
        "healthcare_general_physician",
    ),
    (
        &[
            "pharmacist", "optometrist", "psychologist", "therapist", "dietitian",
            "chiropractor", "clinician", "nurse practitioner", "physician assistant",
            "audiologist", "pathologist", "psychometrician", "therapy", "wellness", "audiology",
        ],
        "healthcare_advanced_practice",
    ),
    (
        &[
            "nurse", "nursing", "technologist", "sonographer", "paramedic", "emt", "technician",
            "dental hygienist", "hygienist", "radiologic", "surgical tech", "nutritionist",
            "echocardiographer", "mammography", "polysomnographer", "palliative",
        ],
        "healthcare_nursing_allied",
    ),
    (
        &[
            "phlebotomist", "caregiver", "nanny", "provider", "aide", "medical assistant",
            "patient care", "home health", "personal care", "phlebotomy", "care",
        ],
        "healthcare_support",
    ),
    (
        &[
            "healthcare", "medical", "clinical", "patient", "pharmacy", "surgical", "dental",
            "ambulatory", "telemedicine", "clinic",
        ],
        "healthcare_other",
    ),
    (
        &[
            "finance", "financial", "investment", "accounting", "accountant", "investor", "tax",
            "auditor", "banker", "teller", "reinsurance", "controller", "payroll", "bookkeeper",
            "billing", "adjuster", "appraiser", "actuary", "advisor", "loan", "mortgage",
            "collections", "trader", "derivatives", "fixed income", "treasury", "actuarial",
            "valuations", "chargeback", "broker", "economist",
        ],
        "finance_accounting",
    ),
    (&["insurance", "claims"], "insurance"),
    (&["compliance", "regulatory", "credentialing", "kyc"], "compliance_regulatory"),
    (&["environmental health", "safety", "hazardous materials"], "safety_environmental"),
    (
        &[
            "human resources", "talent", "recruiter", "employee", "people operations",
            "onboarding", "training", "benefits", "generalist",
        ],
        "hr",
    ),
    (
        &[
            "marketing", "creative", "content", "writer", "designer", "communications",
            "social media", "editor", "producer", "art director", "brand ambassador", "stylist",
            "strategist", "seo", "paid search", "proofreader", "news", "reporter",
        ],
        "marketing_creative",
    ),
    (
        &[
            "sales", "account", "business development", "setter", "acct. exec", "agent",
            "business",
        ],
        "sales",
    ),
    (
        &[
            "supply chain", "logistics", "warehouse", "sourcing", "shipper", "receiving",
            "buyer", "procurement", "inventory", "dispatcher", "selector", "filler",
            "purchasing", "merchandiser", "delivery", "planner", "forwarder", "freight",
            "vendor", "shipping",
        ],
        "supply_chain",
    ),
    (
        &[
            "technician", "estimator", "welder", "driver", "handler", "maintenance", "mechanic",
            "inspector", "assembler", "electrician", "operator", "coiling", "custodian",
            "janitor", "machinist", "laborer", "plumber", "carpenter", "installer", "locksmith",
            "painter", "fabricator", "detailer", "cleaner", "splicer", "groundskeeper",
            "caretaker", "landscaper", "manufacturing", "millwright", "worker", "toolmaker",
            "tool & die", "hvac", "rigger", "roofer", "jeweler", "truck", "meat", "forklift",
            "gardener",
        ],
        "skilled_trades",
    ),
    (
        &[
            "housekeeper", "attendant", "hospitality", "busser", "server", "house person",
            "aide", "cook", "chef", "dishwasher", "barista", "bartender", "host", "valet",
            "groomer", "trainer", "food service", "crewmember", "lifeguard", "baker",
            "esthetician", "fryer", "bakery", "deli", "beauty", "concierge", "culinary",
            "housekeeping", "waxing",
        ],
        "service_hospitality",
    ),
    (
        &[
            "administrative", "assistant", "customer service", "support", "representative",
            "coordinator", "clerk", "examiner", "office manager", "receptionist", "data entry",
            "front desk", "scheduler", "clerical", "client service", "customer success",
            "help desk", "contact center", "documentation", "records", "advocate", "liaison",
            "secretary", "mail", "mailroom", "desk",
        ],
        "admin_support",
    ),
    (
        &[
            "security", "protection", "investigator", "police", "correctional", "officer",
            "assessor", "fedramp",
        ],
        "security",
    ),
    (&["real estate", "leasing", "property"], "real_estate"),
    (
        &[
            "store", "retail", "merchant", "cashier", "team member", "stock", "keyholder",
            "checker",
        ],
        "retail",
    ),
    (
        &[
            "faculty", "instructor", "teacher", "proctor", "educator", "tutor", "coach", "dean",
            "paraprofessional", "mentor",
        ],
        "education",
    ),
    (
        &[
            "social work", "case manager", "counselor", "behavior", "youth", "chaplain",
        ],
        "social_services",
    ),
    (&["pilot", "aviation", "flight"], "aviation"),
    (&["linguist", "translator", "interpreter"], "linguistics_translation"),
    (&["photographer", "animator", "artist", "illustrator", "retoucher"], "creative_arts"),
    (&["curator", "archivist", "librarian"], "archive_curation"),
    (&["surveyor", "landman"], "surveying_land"),
    (
        &[
            "manager", "management", "director", "supervisor", "lead", "vp", "vice president",
            "executive", "chief", "superintendent", "foreman", "head", "partner", "principal",
        ],
        "management_leadership",
    ),
    (&["analyst", "analytics"], "analyst"),
    (&["product"], "product"),
    (&["consultant"], "consulting"),
    (&["operations"], "operations"),
    (&["project"], "project_management"),
    (&["strategy"], "strategy"),
    (&["qa", "qc"], "quality_assurance"),
    (&["it", "dev", "dba", "gis", "cad"], "engineering_it"),
    (&["hr"], "hr"),
    (&["ds"], "data_scientist"),
    (
        &[
            "rn", "lpn", "cna", "mri", "health", "pt", "ot", "lvn", "cma", "pta", "cota",
            "lmsw", "licsw", "lmft", "lmhc",
        ],
        "healthcare",
    ),
    (&["cfo", "cpa"], "finance_accounting"),
    (&["ehs"], "safety_environmental"),
    (&["bio"], "biology"),
    (&["ceo", "cso", "cvo", "cbo"], "general_management"),
    (&["specialist", "specialists"], "specialist"),
    (&["associate"], "associate"),
];

/// Classifies a job title into one of the job-function labels.
/// `other` when no rule matches, `unknown` for a missing title.
pub fn extract_job_function(title: Option<&str>) -> String {
    let Some(title) = title else {
        return UNKNOWN.to_string();
    };
    let title_lower = title.to_lowercase();

    JOB_FUNCTION_RULES
        .iter()
        .find(|(keywords, _)| contains_any(&title_lower, keywords))
        .map(|(_, function)| (*function).to_string())
        .unwrap_or_else(|| OTHER.to_string())
}
