//! Offer ranking and reply rendering.
//!
//! The presenter shows at most three offers per search: the single fastest
//! itinerary, then up to two cheapest ones that are not the fastest. Ties on
//! duration break toward the lower price; ties on price toward the shorter
//! duration.

use crate::domain::dialog::DialogState;
use crate::domain::search::{FlightOffer, SearchRequest, SearchResults};

/// The offers chosen for display.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedOffers {
    pub fastest: FlightOffer,
    /// Up to two cheapest offers, the fastest excluded, cheapest first.
    pub cheapest: Vec<FlightOffer>,
}

/// Picks the fastest and up-to-two cheapest offers.
///
/// Returns `None` on an empty result set; the caller renders the explicit
/// no-flights reply instead.
pub fn rank(offers: &[FlightOffer]) -> Option<RankedOffers> {
    let fastest = offers
        .iter()
        .min_by(|a, b| {
            a.duration_minutes
                .cmp(&b.duration_minutes)
                .then(a.price_total.total_cmp(&b.price_total))
        })?
        .clone();

    let mut rest: Vec<&FlightOffer> = offers.iter().filter(|o| o.id != fastest.id).collect();
    rest.sort_by(|a, b| {
        a.price_total
            .total_cmp(&b.price_total)
            .then(a.duration_minutes.cmp(&b.duration_minutes))
    });
    let cheapest = rest.into_iter().take(2).cloned().collect();

    Some(RankedOffers { fastest, cheapest })
}

/// Renders search outcomes and trip summaries into traveler-facing text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Presenter;

impl Presenter {
    pub fn new() -> Self {
        Self
    }

    /// Renders a completed search for display.
    pub fn render(&self, request: &SearchRequest, results: &SearchResults) -> String {
        match rank(&results.offers) {
            Some(ranked) => self.render_offers(request, &ranked, results.cached),
            None => self.render_empty(request),
        }
    }

    fn render_offers(&self, request: &SearchRequest, ranked: &RankedOffers, cached: bool) -> String {
        let mut out = format!(
            "Here is what I found for {} to {} on {}:\n",
            request.origin, request.destination, request.departure_date
        );
        out.push_str(&format!("\nFastest: {}", describe(&ranked.fastest)));
        for (i, offer) in ranked.cheapest.iter().enumerate() {
            let label = if i == 0 { "Cheapest" } else { "Also cheap" };
            out.push_str(&format!("\n{label}: {}", describe(offer)));
        }
        if cached {
            out.push_str("\n\n(Prices from a few minutes ago.)");
        }
        out.push_str("\n\nWant me to change anything about this search?");
        out
    }

    /// Explicit empty-result reply with the searched parameters, so the user
    /// can see exactly what came up empty and adjust.
    fn render_empty(&self, request: &SearchRequest) -> String {
        let trip = match &request.return_date {
            Some(ret) => format!(
                "{} to {} departing {} returning {}",
                request.origin, request.destination, request.departure_date, ret
            ),
            None => format!(
                "{} to {} on {} (one-way)",
                request.origin, request.destination, request.departure_date
            ),
        };
        format!(
            "I couldn't find any flights for {trip} for {} passenger(s). \
             Try a different date, or a nearby airport.",
            request.passengers
        )
    }

    /// One-line summary of what has been captured so far.
    pub fn trip_summary(&self, state: &DialogState) -> String {
        let mut parts = Vec::new();
        if let Some(origin) = &state.origin {
            parts.push(format!("from {origin}"));
        }
        if let Some(destination) = &state.destination {
            parts.push(format!("to {destination}"));
        }
        if let Some(date) = state.departure_date {
            parts.push(format!("departing {date}"));
        }
        if let Some(date) = state.return_date {
            parts.push(format!("returning {date}"));
        }
        if let Some(n) = state.passengers {
            parts.push(format!("{n} passenger(s)"));
        }
        if parts.is_empty() {
            "nothing captured yet".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn describe(offer: &FlightOffer) -> String {
    let hours = offer.duration_minutes / 60;
    let minutes = offer.duration_minutes % 60;
    let stops = match offer.stops {
        0 => "nonstop".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{n} stops"),
    };
    format!(
        "{} {} — {:.2} {} — {}h{:02}m, {}",
        offer.carrier, offer.segment_summary, offer.price_total, offer.currency, hours, minutes, stops
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::LocationCode;

    fn offer(id: &str, price: f64, minutes: u32) -> FlightOffer {
        FlightOffer {
            id: id.into(),
            carrier: "AA".into(),
            price_total: price,
            currency: "USD".into(),
            duration_minutes: minutes,
            stops: 0,
            segment_summary: "JFK-LHR".into(),
        }
    }

    fn request() -> SearchRequest {
        SearchRequest {
            origin: LocationCode::new("NYC"),
            destination: LocationCode::new("LON"),
            departure_date: "2025-12-15".parse().unwrap(),
            return_date: None,
            passengers: 1,
        }
    }

    #[test]
    fn fastest_is_excluded_from_the_cheap_picks() {
        let offers = vec![
            offer("a", 900.0, 400),
            offer("b", 300.0, 500),
            offer("c", 350.0, 520),
            offer("d", 250.0, 480),
        ];
        let ranked = rank(&offers).unwrap();
        assert_eq!(ranked.fastest.id, "a");
        let cheap_ids: Vec<&str> = ranked.cheapest.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(cheap_ids, vec!["d", "b"]);
    }

    #[test]
    fn single_offer_ranks_as_fastest_alone() {
        let offers = vec![offer("only", 500.0, 450)];
        let ranked = rank(&offers).unwrap();
        assert_eq!(ranked.fastest.id, "only");
        assert!(ranked.cheapest.is_empty());
    }

    #[test]
    fn duration_tie_breaks_toward_the_cheaper_offer() {
        let offers = vec![offer("pricey", 900.0, 400), offer("cheap", 300.0, 400)];
        let ranked = rank(&offers).unwrap();
        assert_eq!(ranked.fastest.id, "cheap");
    }

    #[test]
    fn empty_offers_rank_as_none() {
        assert!(rank(&[]).is_none());
    }

    #[test]
    fn empty_results_render_the_searched_parameters() {
        let text = Presenter::new().render(
            &request(),
            &SearchResults {
                offers: vec![],
                cached: false,
            },
        );
        assert!(text.contains("couldn't find any flights"));
        assert!(text.contains("NYC to LON"));
        assert!(text.contains("2025-12-15"));
    }

    #[test]
    fn cached_results_are_marked() {
        let results = SearchResults {
            offers: vec![offer("a", 500.0, 450)],
            cached: true,
        };
        let text = Presenter::new().render(&request(), &results);
        assert!(text.contains("a few minutes ago"));
    }
}
