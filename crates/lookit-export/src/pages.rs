//! Page-by-page iteration over the response query layer.
//!
//! A failing page aborts the whole walk; nothing retries here.

use lookit_core::{
  collisions::{CollisionChecker, CollisionReport},
  fields::Projection,
  response::ResponseRecord,
  store::{ResponseQuery, ResponseStore},
};
use tracing::debug;

use crate::{Error, Result};

/// Call `f` once per page of fully resolved responses, in query order.
pub async fn for_each_response_page<S, F>(
  store: &S,
  query: &ResponseQuery,
  mut f: F,
) -> Result<usize>
where
  S: ResponseStore,
  F: FnMut(&[ResponseRecord]) -> Result<()>,
{
  let mut page_number = 1;
  let mut total = 0;
  loop {
    let page = store
      .fetch_page(query, page_number)
      .await
      .map_err(Error::store)?;
    debug!(study = %query.study_id, page = page_number, rows = page.items.len(), "fetched response page");

    total += page.items.len();
    f(&page.items)?;
    if !page.has_next {
      return Ok(total);
    }
    page_number += 1;
  }
}

/// Call `f` once per page of flat projections, in query order.
pub async fn for_each_projection_page<S, F>(
  store: &S,
  query: &ResponseQuery,
  mut f: F,
) -> Result<usize>
where
  S: ResponseStore,
  F: FnMut(&[Projection]) -> Result<()>,
{
  let mut page_number = 1;
  let mut total = 0;
  loop {
    let page = store
      .fetch_projection_page(query, page_number)
      .await
      .map_err(Error::store)?;
    debug!(study = %query.study_id, page = page_number, rows = page.items.len(), "fetched projection page");

    total += page.items.len();
    f(&page.items)?;
    if !page.has_next {
      return Ok(total);
    }
    page_number += 1;
  }
}

/// Check hashed-ID uniqueness over every response the query returns.
pub async fn check_collisions<S: ResponseStore>(
  store: &S,
  query: &ResponseQuery,
) -> Result<CollisionReport> {
  let mut checker = CollisionChecker::new();
  for_each_projection_page(store, query, |page| {
    for projection in page {
      checker.observe(projection);
    }
    Ok(())
  })
  .await?;
  Ok(checker.report())
}
