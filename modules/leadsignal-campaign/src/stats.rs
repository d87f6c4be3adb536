/// Stats from one campaign execution.
#[derive(Debug, Default)]
pub struct EnrichmentStats {
    pub records_fetched: u32,
    pub businesses_ingested: u32,
    pub duplicates_merged: u32,
    pub records_dropped: u32,
    pub with_email_primary: u32,
    pub no_email_with_social: u32,
    pub no_email_no_social: u32,
    pub social_pages_fetched: u32,
    pub enriched_social_direct: u32,
    pub enriched_social_via_search: u32,
    pub discovery_queries: u32,
    pub discovery_pages_found: u32,
    pub still_unresolved: u32,
    pub stage_warnings: u32,
}

impl EnrichmentStats {
    pub fn total_with_email(&self) -> u32 {
        self.with_email_primary + self.enriched_social_direct + self.enriched_social_via_search
    }
}

impl std::fmt::Display for EnrichmentStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Campaign Run Complete ===")?;
        writeln!(f, "Records fetched:     {}", self.records_fetched)?;
        writeln!(f, "Businesses ingested: {}", self.businesses_ingested)?;
        writeln!(f, "Duplicates merged:   {}", self.duplicates_merged)?;
        writeln!(f, "Records dropped:     {}", self.records_dropped)?;
        writeln!(f, "\nEmail resolution:")?;
        writeln!(f, "  Primary scrape:    {}", self.with_email_primary)?;
        writeln!(f, "  Social direct:     {}", self.enriched_social_direct)?;
        writeln!(f, "  Social via search: {}", self.enriched_social_via_search)?;
        writeln!(f, "  Unresolved:        {}", self.still_unresolved)?;
        let total = self.businesses_ingested.max(1);
        writeln!(
            f,
            "  Total with email:  {} ({:.0}%)",
            self.total_with_email(),
            self.total_with_email() as f64 / total as f64 * 100.0
        )?;
        writeln!(f, "\nSocial pages fetched: {}", self.social_pages_fetched)?;
        if self.discovery_queries > 0 {
            writeln!(f, "Discovery queries:    {}", self.discovery_queries)?;
            writeln!(f, "Discovery pages:      {}", self.discovery_pages_found)?;
        }
        if self.stage_warnings > 0 {
            writeln!(f, "Stage warnings:       {}", self.stage_warnings)?;
        }
        Ok(())
    }
}
