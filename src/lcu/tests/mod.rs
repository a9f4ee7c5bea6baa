// Tests for the champ select automation

#[cfg(test)]
mod test_helpers;




#[cfg(test)]
mod test_event_loop;
