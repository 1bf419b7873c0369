use super::{Decision, Engine};

use async_trait::async_trait;
use std::net::IpAddr;

use crate::{
    api::{LocationAPI, RouteAPI, RouteOutcome, RouteResult, RouteView},
    entities::{Notice, Origin, RecalculationRequest, RoutingEndpoint, TransportMode},
    error::Error,
};

impl Engine {
    /// Reuses a recent fix for "current location"; acquires a new one otherwise.
    async fn locate_origin(
        &self,
        client_ip: Option<IpAddr>,
        notices: &mut Vec<Notice>,
    ) -> Result<RoutingEndpoint, Error> {
        if let Some(position) = self.provider.fresh_position()? {
            return Ok(RoutingEndpoint::current_location(&position));
        }

        let acquisition = self.acquire_position(None, client_ip).await?;
        notices.extend(acquisition.notices);

        Ok(RoutingEndpoint::current_location(&acquisition.position))
    }
}

#[async_trait]
impl RouteAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn request_route(
        &self,
        origin: Origin,
        destination: RoutingEndpoint,
        mode: TransportMode,
        client_ip: Option<IpAddr>,
    ) -> Result<RouteResult, Error> {
        let generation = self.policy.input_changed();

        if !self.policy.settle(generation).await {
            return Ok(RouteResult::new(RouteOutcome::Superseded, vec![]));
        }

        let mut notices = vec![];

        let origin = match origin {
            Origin::CurrentLocation => self.locate_origin(client_ip, &mut notices).await?,
            Origin::Endpoint { endpoint } => endpoint,
        };

        tracing::info!(from = %origin.label, to = %destination.label, "route requested");

        let request = RecalculationRequest {
            origin: origin.coordinates,
            destination: destination.coordinates,
            mode,
        };

        // locating the origin may have taken long enough for a newer request to land
        if !self.policy.is_latest(generation) {
            return Ok(RouteResult::new(RouteOutcome::Superseded, notices));
        }

        if let Err(err) = request.origin.validate().and(request.destination.validate()) {
            tracing::warn!("rejecting route request: {}", err);

            self.policy.reset(|| self.state.clear_route())?;

            return Err(err);
        }

        let decision = self
            .policy
            .evaluate(request, generation, || self.state.set_calculating(true))?;

        let ticket = match decision {
            Decision::Recompute(ticket) => ticket,
            Decision::Unchanged => return Ok(RouteResult::new(RouteOutcome::Unchanged, notices)),
            Decision::InFlight => return Ok(RouteResult::new(RouteOutcome::InFlight, notices)),
            Decision::Superseded => return Ok(RouteResult::new(RouteOutcome::Superseded, notices)),
        };

        let route = match self
            .fetcher
            .compute_route(request.origin, request.destination, mode)
            .await
        {
            Ok(route) => route,
            Err(err) => {
                self.policy
                    .abandon(&ticket, || self.state.set_calculating(false))?;
                return Err(err);
            }
        };

        if route.is_approximated() {
            notices.push(Notice::ApproximateRoute);
        }

        let mut applied = None;
        self.policy
            .finish(&ticket, || applied = Some(self.state.set_route(route)))?;

        match applied {
            Some(route) => Ok(RouteResult::new(
                RouteOutcome::Applied { view: route.into() },
                notices,
            )),
            None => {
                tracing::info!(sequence = ticket.sequence, "discarding stale route");
                Ok(RouteResult::new(RouteOutcome::Discarded, notices))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn current_route(&self) -> Result<Option<RouteView>, Error> {
        Ok(self.state.snapshot().route.map(RouteView::from))
    }

    #[tracing::instrument(skip(self))]
    async fn clear_route(&self) -> Result<(), Error> {
        self.policy.reset(|| self.state.clear_route())?;

        Ok(())
    }
}
