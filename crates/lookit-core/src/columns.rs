//! Column registries for the response and demographic exports.
//!
//! A registry is an ordered, immutable table of [`Column`]s. Order is
//! significant: it fixes the CSV header order and the JSON nesting. Optional
//! columns only appear when the caller selects them; the `identifiable` flag
//! only affects file naming and never redacts anything.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value, json};

use crate::{
  Error, Result,
  fields::FieldSource,
  flatten::flatten_under,
  hash,
};

/// Separator between the group and field halves of a column id.
pub const GROUP_SEPARATOR: &str = "__";

// ─── Column ──────────────────────────────────────────────────────────────────

/// How a column obtains its value from a record.
#[derive(Clone, Copy)]
pub enum Extractor {
  /// Read a field path directly.
  Path(&'static str),
  /// Derive the value from several fields.
  Computed(fn(&dyn FieldSource) -> Value),
}

impl std::fmt::Debug for Extractor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
      Self::Computed(_) => f.write_str("Computed"),
    }
  }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
  pub id:                 &'static str,
  pub name:               &'static str,
  pub description:        &'static str,
  pub extractor:          Extractor,
  pub optional:           bool,
  /// Whether an optional column is selected when the caller names none.
  pub include_by_default: bool,
  pub identifiable:       bool,
  /// Container-valued; flattened into `id.N...` keys in CSV output.
  pub nested:             bool,
}

impl Column {
  const fn new(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    extractor: Extractor,
  ) -> Self {
    Self {
      id,
      name,
      description,
      extractor,
      optional: false,
      include_by_default: false,
      identifiable: false,
      nested: false,
    }
  }

  const fn path(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    path: &'static str,
  ) -> Self {
    Self::new(id, name, description, Extractor::Path(path))
  }

  const fn computed(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    f: fn(&dyn FieldSource) -> Value,
  ) -> Self {
    Self::new(id, name, description, Extractor::Computed(f))
  }

  const fn by_default(self) -> Self {
    Self { optional: true, include_by_default: true, ..self }
  }

  const fn identifiable(self) -> Self {
    Self { optional: true, identifiable: true, ..self }
  }

  const fn nested(self) -> Self { Self { nested: true, ..self } }

  /// This column's value for `src`. Missing fields come back as `Null`.
  pub fn extract(&self, src: &dyn FieldSource) -> Value {
    match self.extractor {
      Extractor::Path(path) => {
        src.field(path).map(|v| v.into_owned()).unwrap_or(Value::Null)
      }
      Extractor::Computed(f) => f(src),
    }
  }

  /// `(group, field)` when the id splits cleanly on one separator.
  pub fn group(&self) -> Option<(&'static str, &'static str)> {
    let (group, field) = self.id.split_once(GROUP_SEPARATOR)?;
    (!field.contains(GROUP_SEPARATOR)).then_some((group, field))
  }
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// The optional column ids a caller asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<String>);

impl Selection {
  pub fn contains(&self, id: &str) -> bool { self.0.contains(id) }

  pub fn ids(&self) -> impl Iterator<Item = &str> { self.0.iter().map(String::as_str) }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// One CSV row: flattened column key → value.
pub type Row = BTreeMap<String, Value>;

#[derive(Debug)]
pub struct Registry {
  pub name:    &'static str,
  pub columns: &'static [Column],
}

impl Registry {
  pub fn get(&self, id: &str) -> Option<&Column> {
    self.columns.iter().find(|c| c.id == id)
  }

  /// The selection used when a caller names no optional columns.
  pub fn default_selection(&self) -> Selection {
    Selection(
      self
        .columns
        .iter()
        .filter(|c| c.include_by_default)
        .map(|c| c.id.to_owned())
        .collect(),
    )
  }

  /// Parse a comma-separated list of optional column ids. `None` selects the
  /// defaults; any id this registry does not know rejects the whole request.
  pub fn parse_selection(&self, raw: Option<&str>) -> Result<Selection> {
    let Some(raw) = raw else {
      return Ok(self.default_selection());
    };

    let mut ids = BTreeSet::new();
    for id in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
      let column = self.get(id).ok_or_else(|| Error::UnknownColumn(id.to_owned()))?;
      if column.optional {
        ids.insert(column.id.to_owned());
      }
    }
    Ok(Selection(ids))
  }

  /// Columns that appear in output under `selection`, in registry order.
  pub fn selected<'a>(
    &'a self,
    selection: &'a Selection,
  ) -> impl Iterator<Item = &'a Column> + 'a {
    self
      .columns
      .iter()
      .filter(move |c| !c.optional || selection.contains(c.id))
  }

  /// Whether any selected column carries directly identifying data.
  pub fn is_identifiable(&self, selection: &Selection) -> bool {
    self.selected(selection).any(|c| c.identifiable)
  }

  /// CSV header: selected flat columns in registry order, then every other
  /// key seen in the data, sorted.
  pub fn header<'k>(
    &self,
    selection: &Selection,
    data_keys: impl IntoIterator<Item = &'k String>,
  ) -> Vec<String> {
    let mut header: Vec<String> = self
      .selected(selection)
      .filter(|c| !c.nested)
      .map(|c| c.id.to_owned())
      .collect();

    let extras: BTreeSet<&String> = data_keys
      .into_iter()
      .filter(|key| self.get(key).is_none())
      .filter(|key| !self.belongs_to_unselected(key, selection))
      .collect();

    header.extend(extras.into_iter().cloned());
    header
  }

  fn belongs_to_unselected(&self, key: &str, selection: &Selection) -> bool {
    self
      .columns
      .iter()
      .filter(|c| c.optional && !selection.contains(c.id))
      .any(|c| {
        key
          .strip_prefix(c.id)
          .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
      })
  }

  /// One CSV row. Nested columns contribute one key per leaf.
  pub fn csv_row(&self, selection: &Selection, src: &dyn FieldSource) -> Row {
    let mut row = Row::new();
    for column in self.selected(selection) {
      let value = column.extract(src);
      if column.nested {
        if value.is_array() || value.is_object() {
          for (key, leaf) in flatten_under(column.id.to_owned(), &value) {
            row.insert(key, leaf.clone());
          }
        }
      } else {
        row.insert(column.id.to_owned(), value);
      }
    }
    row
  }

  /// One JSON record, grouped on the first `__` of each column id.
  ///
  /// Ids with more than one separator cannot be grouped unambiguously and
  /// stay flat at the top level.
  pub fn json_record(
    &self,
    selection: &Selection,
    src: &dyn FieldSource,
  ) -> Map<String, Value> {
    let mut record = Map::new();
    for column in self.selected(selection) {
      let value = column.extract(src);
      match column.group() {
        Some((group, field)) => {
          let entry = record
            .entry(group)
            .or_insert_with(|| Value::Object(Map::new()));
          if let Value::Object(map) = entry {
            map.insert(field.to_owned(), value);
          }
        }
        None => {
          record.insert(column.id.to_owned(), value);
        }
      }
    }
    record
  }

  /// `(id, description)` for every selected column. Needs no data.
  pub fn dictionary<'a>(
    &'a self,
    selection: &'a Selection,
  ) -> impl Iterator<Item = (&'static str, &'static str)> + 'a {
    self.selected(selection).map(|c| (c.id, c.description))
  }
}

// ─── Computed extractors ─────────────────────────────────────────────────────

/// Round an age in days: to the nearest 10 under a year, otherwise to the
/// nearest 30. Halves round to even.
pub fn round_age(days: i64) -> i64 {
  let step = if days < 365 { 10.0 } else { 30.0 };
  ((days as f64 / step).round_ties_even() * step) as i64
}

fn age_in_days(src: &dyn FieldSource) -> Option<i64> {
  let created = src.date("date_created")?;
  let birthday = src.date("child__birthday")?;
  Some((created - birthday).num_days())
}

fn child_age_in_days(src: &dyn FieldSource) -> Value { json!(age_in_days(src)) }

fn child_age_rounded(src: &dyn FieldSource) -> Value {
  json!(age_in_days(src).map(round_age))
}

fn child_hashed_id(src: &dyn FieldSource) -> Value { json!(hash::child_hashed_id(src)) }

fn participant_hashed_id(src: &dyn FieldSource) -> Value {
  json!(hash::participant_hashed_id(src))
}

fn demographic_hashed_id(src: &dyn FieldSource) -> Value {
  json!(hash::demographic_hashed_id(src))
}

/// Condition assignments as a list, each entry tagged with the randomizer
/// frame that made it.
fn response_conditions(src: &dyn FieldSource) -> Value {
  let Some(conditions) = src.field("conditions") else {
    return Value::Array(Vec::new());
  };
  let Some(by_frame) = conditions.as_object() else {
    return Value::Array(Vec::new());
  };

  by_frame
    .iter()
    .map(|(frame, assignment)| {
      let mut entry = Map::new();
      entry.insert("frameName".into(), json!(frame));
      if let Some(fields) = assignment.as_object() {
        entry.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
      }
      Value::Object(entry)
    })
    .collect()
}

/// Rounded ages of every child listed on the snapshot, as of the response.
fn child_rounded_ages(src: &dyn FieldSource) -> Value {
  let Some(taken) = src.date("date_created") else {
    return Value::Null;
  };
  let Some(birthdays) = src.field("demographic_snapshot__child_birthdays") else {
    return Value::Null;
  };

  birthdays
    .as_array()
    .map(Vec::as_slice)
    .unwrap_or_default()
    .iter()
    .filter_map(|b| b.as_str()?.get(..10)?.parse::<chrono::NaiveDate>().ok())
    .map(|birthday| json!(round_age((taken - birthday).num_days())))
    .collect()
}

// ─── Registries ──────────────────────────────────────────────────────────────

/// Columns of the response overview export.
pub static RESPONSES: Registry = Registry {
  name:    "responses",
  columns: &[
    Column::path(
      "response__id",
      "Response ID",
      "Short ID for this response",
      "id",
    ),
    Column::path(
      "response__uuid",
      "Response UUID",
      "Unique identifier for response. Can be used to match data to video \
       filenames.",
      "uuid",
    ),
    Column::path(
      "response__date_created",
      "Date created",
      "Timestamp for when participant began session, in format e.g. \
       2019-11-07 17:13:38.702958+00:00",
      "date_created",
    ),
    Column::path(
      "response__completed",
      "Completed",
      "Whether the participant submitted the exit survey; depending on study \
       flow, this may not indicate whether they completed the study.",
      "completed",
    ),
    Column::path(
      "response__withdrawn",
      "Withdrawn",
      "Whether the participant withdrew permission for viewing/use of study \
       video beyond consent video. If true, video will not be available and \
       must not be used.",
      "withdrawn",
    ),
    Column::path(
      "response__parent_feedback",
      "Parent feedback",
      "Freeform parent feedback entered into the exit survey, if any. This \
       field may incidentally contain identifying or sensitive information \
       depending on what parents say, so it should be scrubbed or omitted \
       from published data.",
      "parent_feedback",
    ),
    Column::path(
      "response__birthdate_difference",
      "Birthdate difference",
      "Difference between birthdate entered in exit survey, if any, and \
       birthdate of registered child participating. Positive values mean that \
       the birthdate from the exit survey is LATER. Blank if no birthdate \
       available from the exit survey.",
      "birthdate_difference",
    ),
    Column::path(
      "response__video_privacy",
      "Video privacy",
      "Privacy level for videos selected during the exit survey, if the \
       parent completed the exit survey. Possible levels are 'private' (only \
       people listed on your IRB protocol can view), 'scientific' (can share \
       for scientific/educational purposes), and 'public' (can also share \
       for publicity). In no cases may videos be shared for commercial \
       purposes. If this is missing (e.g., family stopped just after the \
       consent form and did not complete the exit survey), you must treat \
       the video as private.",
      "video_privacy",
    ),
    Column::path(
      "response__databrary",
      "Databrary sharing",
      "Whether the parent agreed to share video data on Databrary - 'yes' or \
       'no'. If missing, you must treat the video as if 'no' were selected. \
       If 'yes', the video privacy selections also apply to authorized \
       Databrary users.",
      "databrary",
    ),
    Column::path(
      "response__is_preview",
      "Preview",
      "Whether this response was generated by a researcher previewing the \
       experiment. Preview data should not be used in any actual analyses.",
      "is_preview",
    ),
    Column::path(
      "response__eligibility",
      "Eligibility",
      "List of eligibility codes (defined in Lookit docs), separated by \
       spaces. Can be either 'Eligible' or one or more of: \
       'Ineligible_TooYoung'/'Ineligible_TooOld', \
       'Ineligible_CriteriaExpression', 'Ineligible_Participation'",
      "eligibility",
    ),
    Column::path(
      "consent__ruling",
      "Consent ruling",
      "Most recent consent video ruling: one of 'accepted' (consent has been \
       reviewed and judged to indicate informed consent), 'rejected' \
       (consent has been reviewed and judged not to indicate informed \
       consent -- e.g., video missing or parent did not read statement), or \
       'pending' (no current judgement, e.g. has not been reviewed yet or \
       waiting on parent email response')",
      "consent__ruling",
    ),
    Column::path(
      "consent__arbiter",
      "Consent arbiter",
      "Name associated with researcher account that made the most recent \
       consent ruling",
      "consent__arbiter",
    ),
    Column::path(
      "consent__time",
      "Consent time",
      "Timestamp of most recent consent ruling, format e.g. 2019-12-09 \
       20:40",
      "consent__time",
    ),
    Column::path(
      "consent__comment",
      "Consent comment",
      "Comment associated with most recent consent ruling (may be used to \
       track e.g. any cases where consent was confirmed by email)",
      "consent__comment",
    ),
    Column::path(
      "study__uuid",
      "Study UUID",
      "Unique identifier of study associated with this response. Same for \
       all responses to a given Lookit study.",
      "study__uuid",
    ),
    Column::path(
      "participant__global_id",
      "Parent global ID",
      "Unique identifier for family account associated with this response. \
       Will be the same for multiple responses from a child and for siblings, \
       and across different studies. MUST BE REDACTED FOR PUBLICATION because \
       this allows identification of families across different published \
       studies, which may have unintended privacy consequences. Researchers \
       can use this ID to match participants across studies (subject to \
       their own IRB review), but would need to generate their own random \
       participant IDs for publication in that case. Use \
       participant__hashed_id as a publication-safe alternative if only \
       analyzing data from one Lookit study.",
      "child__user__uuid",
    )
    .identifiable(),
    Column::computed(
      "participant__hashed_id",
      "Parent ID",
      "Identifier for family account associated with this response. Will be \
       the same for multiple responses from a child and for siblings, but is \
       unique to this study. This may be published directly.",
      participant_hashed_id,
    ),
    Column::path(
      "participant__nickname",
      "Parent name",
      "Nickname associated with the family account for this response - \
       generally the mom or dad's name. Must be redacted for publication.",
      "child__user__nickname",
    )
    .identifiable(),
    Column::path(
      "child__global_id",
      "Child global ID",
      "Primary unique identifier for the child associated with this \
       response. Will be the same for multiple responses from one child, \
       even across different Lookit studies. MUST BE REDACTED FOR \
       PUBLICATION because this allows identification of children across \
       different published studies, which may have unintended privacy \
       consequences. Researchers can use this ID to match participants \
       across studies (subject to their own IRB review), but would need to \
       generate their own random participant IDs for publication in that \
       case. Use child__hashed_id as a publication-safe alternative if only \
       analyzing data from one Lookit study.",
      "child__uuid",
    )
    .identifiable(),
    Column::computed(
      "child__hashed_id",
      "Child ID",
      "Identifier for child associated with this response. Will be the same \
       for multiple responses from a child, but is unique to this study. \
       This may be published directly.",
      child_hashed_id,
    ),
    Column::path(
      "child__name",
      "Child name",
      "Nickname for the child associated with the response. Not necessarily \
       a real name (we encourage initials, nicknames, etc. if parents aren't \
       comfortable providing a name) but must be redacted for publication of \
       data.",
      "child__given_name",
    )
    .identifiable(),
    Column::path(
      "child__birthday",
      "Birthdate",
      "Birthdate of child associated with this response. Must be redacted \
       for publication of data (switch to age at time of participation; \
       either use rounded age, jitter the age, or redact timestamps of the \
       participation).",
      "child__birthday",
    )
    .identifiable(),
    Column::computed(
      "child__age_in_days",
      "Age in days",
      "Age in days at time of response of child associated with this \
       response, exact. This can be used in conjunction with timestamps to \
       calculate the child's birthdate, so must be jittered or redacted \
       prior to publication unless no timestamp information is shared.",
      child_age_in_days,
    )
    .identifiable(),
    Column::computed(
      "child__age_rounded",
      "Approximate age",
      "Age in days at time of response of child associated with this \
       response, rounded to the nearest 10 days if under 1 year old and to \
       the nearest 30 days if over 1 year old. May be published; however, if \
       you have more than a few sessions per participant it would be \
       possible to infer the exact age in days (and therefore birthdate) \
       with some effort. In this case you might consider directly jittering \
       birthdates.",
      child_age_rounded,
    )
    .by_default(),
    Column::path(
      "child__gender",
      "Child gender",
      "Parent-identified gender of child, one of 'm' (male), 'f' (female), \
       'o' (other), or 'na' (prefer not to answer)",
      "child__gender",
    )
    .by_default(),
    Column::path(
      "child__age_at_birth",
      "Child gestational age",
      "Gestational age at birth in weeks. One of '40 or more weeks', '39 \
       weeks' through '24 weeks', 'Under 24 weeks', or 'Not sure or prefer \
       not to answer'",
      "child__age_at_birth",
    )
    .by_default(),
    Column::path(
      "child__language_list",
      "Child languages",
      "List of languages spoken (using language codes in Lookit docs), \
       separated by spaces",
      "child__language_list",
    )
    .by_default(),
    Column::path(
      "child__condition_list",
      "Child conditions",
      "List of child characteristics (using condition/characteristic codes \
       in Lookit docs), separated by spaces",
      "child__condition_list",
    )
    .by_default(),
    Column::path(
      "child__additional_information",
      "Child additional information",
      "Free response 'anything else you'd like us to know' field on child \
       registration form for child associated with this response. Should be \
       redacted or reviewed prior to publication as it may include names or \
       other identifying information.",
      "child__additional_information",
    )
    .by_default()
    .identifiable(),
    Column::path(
      "response__sequence",
      "Response sequence",
      "Each response_sequence.N field (response_sequence.0, \
       response_sequence.1, etc.) gives the ID of the Nth frame displayed \
       during the session associated with this response. Responses may have \
       different sequences due to randomization or if a participant leaves \
       early.",
      "sequence",
    )
    .nested(),
    Column::computed(
      "response__conditions",
      "Conditions",
      "RESEARCHERS: EXPAND THIS SECTION BASED ON YOUR INDIVIDUAL STUDY. Each \
       set of response_conditions.N.(...) fields give information about \
       condition assignment during a particular frame of this study. \
       response_conditions.0.frameName is the frame ID (corresponding to a \
       value in response_sequence) where the randomization occurred. \
       Additional fields such as response_conditions.0.conditionNum depend \
       on the specific randomizer frames used in this study.",
      response_conditions,
    )
    .nested(),
  ],
};

/// Columns of the demographic snapshot export.
pub static DEMOGRAPHICS: Registry = Registry {
  name:    "demographics",
  columns: &[
    Column::path(
      "response__uuid",
      "Response UUID",
      "Primary unique identifier for response. Can be used to match \
       demographic data to response data and video filenames; must be \
       redacted prior to publication if videos are also published.",
      "uuid",
    ),
    Column::path(
      "participant__global_id",
      "Parent global ID",
      "Unique identifier for family account associated with this response. \
       Will be the same for multiple responses from a child and for siblings, \
       and across different studies. MUST BE REDACTED FOR PUBLICATION because \
       this allows identification of families across different published \
       studies, which may have unintended privacy consequences.",
      "child__user__uuid",
    )
    .identifiable(),
    Column::computed(
      "participant__hashed_id",
      "Parent ID",
      "Identifier for family account associated with this response. Will be \
       the same for multiple responses from a child and for siblings, but is \
       unique to this study. This may be published directly.",
      participant_hashed_id,
    ),
    Column::computed(
      "demographic__hashed_id",
      "Demographic ID",
      "Identifier for this demographic snapshot. Changes upon updates to the \
       demographic form, so may vary within the same participant across \
       responses.",
      demographic_hashed_id,
    ),
    Column::path(
      "demographic__date_created",
      "Date created",
      "Timestamp of creation of the demographic snapshot associated with \
       this response, in format e.g. 2019-10-02 21:39:03.713283+00:00",
      "demographic_snapshot__created_at",
    ),
    Column::path(
      "demographic__number_of_children",
      "Number of children",
      "Response to 'How many children do you have?'; options 0-10 or >10 \
       (More than 10)",
      "demographic_snapshot__number_of_children",
    ),
    Column::computed(
      "demographic__child_rounded_ages",
      "Child ages rounded",
      "List of rounded ages based on child birthdays entered in demographic \
       form (not based on children registered). Ages are at time of response \
       for this row, in days, rounded to nearest 10 for ages under 1 year \
       and nearest 30 otherwise. In format e.g. [60, 390]",
      child_rounded_ages,
    ),
    Column::path(
      "demographic__languages_spoken_at_home",
      "Languages spoken at home",
      "Freeform response to 'What language(s) does your family speak at \
       home?'",
      "demographic_snapshot__languages_spoken_at_home",
    ),
    Column::path(
      "demographic__number_of_guardians",
      "Number of guardians",
      "Response to 'How many parents/guardians do your children live with?' \
       - 1, 2, 3> [3 or more], varies",
      "demographic_snapshot__number_of_guardians",
    ),
    Column::path(
      "demographic__number_of_guardians_explanation",
      "Number of guardians explanation",
      "Freeform response to 'If the answer varies due to shared custody \
       arrangements or travel, please enter the number of parents/guardians \
       your children are usually living with or explain.'",
      "demographic_snapshot__number_of_guardians_explanation",
    ),
    Column::path(
      "demographic__race_identification",
      "Race",
      "Comma-separated list of all values checked for question 'What \
       category(ies) does your family identify as?', from list: White; \
       Hispanic, Latino, or Spanish origin; Black or African American; \
       Asian; American Indian or Alaska Native; Middle Eastern or North \
       African; Native Hawaiian or Other Pacific Islander; Another race, \
       ethnicity, or origin",
      "demographic_snapshot__race_identification",
    ),
    Column::path(
      "demographic__parent_age",
      "Parent age",
      "Parent's response to question 'What is your age?'; options are <18, \
       18-21, 22-24, 25-29, 30-34, 35-39, 40-44, 45-49, 50s, 60s, >70",
      "demographic_snapshot__age",
    ),
    Column::path(
      "demographic__parent_gender",
      "Parent gender",
      "Parent's response to question 'What is your gender?'; options are m \
       [male], f [female], o [other], na [prefer not to answer]",
      "demographic_snapshot__gender",
    ),
    Column::path(
      "demographic__education_level",
      "Parent education level",
      "Parent's response to question 'What is the highest level of education \
       you've completed?'; options are some [some or attending high school], \
       hs [high school diploma or GED], col [some or attending college], \
       assoc [2-year college degree], bach [4-year college degree], grad \
       [some or attending graduate or professional school], prof [graduate \
       or professional degree]",
      "demographic_snapshot__education_level",
    ),
    Column::path(
      "demographic__spouse_education_level",
      "Parent education level",
      "Parent's response to question 'What is the highest level of education \
       your spouse has completed?'; options are some [some or attending high \
       school], hs [high school diploma or GED], col [some or attending \
       college], assoc [2-year college degree], bach [4-year college degree], \
       grad [some or attending graduate or professional school], prof \
       [graduate or professional degree], na [not applicable - no spouse or \
       partner]",
      "demographic_snapshot__spouse_education_level",
    ),
    Column::path(
      "demographic__annual_income",
      "Annual income",
      "Parent's response to question 'What is your approximate family yearly \
       income (in US dollars)?'; options are 0, 5000, 10000, 15000, 20000-190000 \
       in increments of 10000, >200000, or na [prefer not to answer]",
      "demographic_snapshot__annual_income",
    ),
    Column::path(
      "demographic__number_of_books",
      "Number of books",
      "Parent's response to question 'About how many children's books are \
       there in your home?'; integer",
      "demographic_snapshot__number_of_books",
    ),
    Column::path(
      "demographic__additional_comments",
      "Additional comments",
      "Parent's freeform response to question 'Anything else you'd like us \
       to know?'",
      "demographic_snapshot__additional_comments",
    ),
    Column::path(
      "demographic__country",
      "Country",
      "Parent's response to question 'What country do you live in?'; 2-letter \
       country code",
      "demographic_snapshot__country",
    ),
    Column::path(
      "demographic__state",
      "US State",
      "Parent's response to question 'What state do you live in?' if country \
       is US; 2-letter state abbreviation",
      "demographic_snapshot__state",
    ),
    Column::path(
      "demographic__density",
      "Density",
      "Parent's response to question 'How would you describe the area where \
       you live?'; options are urban, suburban, rural",
      "demographic_snapshot__density",
    ),
    Column::path(
      "demographic__lookit_referrer",
      "How you heard about Lookit",
      "Parent's freeform response to question 'How did you hear about \
       Lookit?'",
      "demographic_snapshot__lookit_referrer",
    ),
  ],
};
