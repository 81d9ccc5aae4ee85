#[cfg(test)]
mod common;


#[cfg(test)]
mod complaint_owner_tests;

#[cfg(test)]
mod moderation_tests;

#[cfg(test)]
mod map_tests;

#[cfg(test)]
mod geocode_tests;

#[cfg(test)]
mod help_request_tests;

#[cfg(test)]
mod profile_tests;

#[cfg(test)]
mod chat_tests;

#[cfg(test)]
mod media_tests;

#[cfg(test)]
mod health_tests;
