use serde_json::{json, Value};

use crate::parser::json::Document;

/// Template used when a request does not supply its own.
pub fn default_template() -> Document {
    let Value::Object(template) = json!({
        "basics": {
            "name": "",
            "email": "",
            "phone": "",
            "summary": ""
        },
        "experience": [{
            "position": "",
            "company": "",
            "location": "",
            "startDate": "",
            "endDate": "",
            "highlights": []
        }],
        "education": [{
            "institution": "",
            "area": "",
            "studyType": "",
            "startDate": "",
            "endDate": ""
        }],
        "skills": [{
            "name": "",
            "level": "",
            "keywords": []
        }],
        "certifications": [{
            "name": "",
            "date": "",
            "issuer": ""
        }]
    }) else {
        unreachable!("template literal is an object")
    };
    template
}
