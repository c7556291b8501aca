//! Shared test data.

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
  consent::{ConsentAction, ConsentRuling},
  response::{Eligibility, ResponseRecord},
  study::{Account, Child, DemographicSnapshot, Study},
};

pub fn study() -> Study {
  Study {
    uuid:        Uuid::from_u128(0x5700_0000_0000_4000_8000_0000_0000_0001),
    name:        "Baby Physics: Round 2".into(),
    salt:        Uuid::from_u128(0x5a17_0000_0000_4000_8000_0000_0000_0001),
    hash_digits: 6,
    created_at:  Utc.with_ymd_and_hms(2019, 12, 1, 0, 0, 0).unwrap(),
  }
}

pub fn child() -> Child {
  Child {
    uuid:                   Uuid::from_u128(0xc41d_0000_0000_4000_8000_0000_0000_0001),
    account:                Account {
      uuid:     Uuid::from_u128(0xacc0_0000_0000_4000_8000_0000_0000_0001),
      nickname: Some("Jo".into()),
    },
    given_name:             "Sam".into(),
    birthday:               NaiveDate::from_ymd_opt(2019, 3, 3),
    gender:                 Some("f".into()),
    age_at_birth:           Some("40".into()),
    language_list:          "en es".into(),
    condition_list:         String::new(),
    additional_information: "likes trucks".into(),
  }
}

pub fn snapshot() -> DemographicSnapshot {
  DemographicSnapshot {
    uuid: Uuid::from_u128(0xde70_0000_0000_4000_8000_0000_0000_0001),
    account_uuid: Uuid::from_u128(0xacc0_0000_0000_4000_8000_0000_0000_0001),
    created_at: Utc.with_ymd_and_hms(2020, 1, 15, 9, 30, 0).unwrap(),
    number_of_children: Some("2".into()),
    child_birthdays: vec![
      NaiveDate::from_ymd_opt(2019, 3, 3).unwrap(),
      NaiveDate::from_ymd_opt(2016, 7, 20).unwrap(),
    ],
    languages_spoken_at_home: Some("English and Spanish".into()),
    number_of_guardians: Some("2".into()),
    race_identification: vec!["white".into(), "hisp".into()],
    age: Some("30-34".into()),
    gender: Some("f".into()),
    education_level: Some("grad".into()),
    annual_income: Some("50000".into()),
    number_of_books: Some(75),
    country: Some("US".into()),
    state: Some("MA".into()),
    density: Some("urban".into()),
    ..Default::default()
  }
}

/// A completed, accepted response with an exit survey and one global event.
pub fn record() -> ResponseRecord {
  let uuid = Uuid::from_u128(0x4e50_0000_0000_4000_8000_0000_0000_0001);
  let t = Utc.with_ymd_and_hms(2020, 3, 3, 12, 0, 0).unwrap();

  ResponseRecord {
    id: 1,
    uuid,
    study: study(),
    child: child(),
    demographic_snapshot: Some(snapshot()),
    date_created: t,
    completed: true,
    is_preview: false,
    eligibility: vec![Eligibility::Eligible],
    sequence: vec![
      "0-video-config".into(),
      "1-video-consent".into(),
      "2-test-trial".into(),
      "4-exit-survey".into(),
    ],
    conditions: json!({
      "1-randomizer": { "conditionNum": 0, "parameterSet": { "order": "A" } },
    }),
    exp_data: json!({
      "0-video-config": {
        "frameType": "DEFAULT",
        "generatedProperties": {},
        "eventTimings": [
          { "eventType": "nextFrame", "timestamp": "2020-03-03T12:00:05Z" },
        ],
      },
      "1-video-consent": {
        "frameType": "CONSENT",
        "videoId": "videoStream_consent_1",
      },
      "2-test-trial": {
        "frameType": "DEFAULT",
        "selectedImage": "left",
        "responses": { "q1": "a", "q2": {} },
        "generatedProperties": { "side": "left" },
      },
      "4-exit-survey": {
        "frameType": "EXIT",
        "birthDate": "2019-03-03T05:00:00.000Z",
        "withdrawal": false,
        "useOfMedia": "scientific",
        "databraryShare": "yes",
        "feedback": "Fun study!",
      },
    }),
    global_event_timings: json!([
      { "eventType": "exitEarly", "reason": "Browser navigation" },
    ]),
    consent_rulings: vec![
      ConsentRuling {
        id:            1,
        response_uuid: uuid,
        action:        ConsentAction::Rejected,
        arbiter:       "Dr. First".into(),
        comment:       Some("no audio".into()),
        created_at:    t,
      },
      ConsentRuling {
        id:            2,
        response_uuid: uuid,
        action:        ConsentAction::Accepted,
        arbiter:       "Dr. Second".into(),
        comment:       None,
        created_at:    t,
      },
    ],
  }
}
