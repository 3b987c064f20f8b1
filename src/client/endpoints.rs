//! API method surface

use super::{field, list, Client, ClientError, Method, Params};
use super::{Domain, Droplet, Event, Image, ImageFilter, NewDroplet, Record, RecordParams, Region, Size, SshKey};

/// Droplet operations that take no arguments and return an event id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropletAction {
    Reboot,
    PowerCycle,
    Shutdown,
    PowerOff,
    PowerOn,
    PasswordReset,
    EnableBackups,
    DisableBackups,
}

impl DropletAction {
    pub fn as_path(&self) -> &'static str {
        match self {
            DropletAction::Reboot => "reboot",
            DropletAction::PowerCycle => "power_cycle",
            DropletAction::Shutdown => "shutdown",
            DropletAction::PowerOff => "power_off",
            DropletAction::PowerOn => "power_on",
            DropletAction::PasswordReset => "password_reset",
            DropletAction::EnableBackups => "enable_backups",
            DropletAction::DisableBackups => "disable_backups",
        }
    }

    fn method(&self) -> Method {
        match self {
            DropletAction::PowerOff | DropletAction::PowerOn | DropletAction::PasswordReset => {
                Method::Get
            }
            _ => Method::Post,
        }
    }
}

impl Client {
    async fn event_id(&self, method: Method, path: &str, params: Params) -> Result<u64, ClientError> {
        let mut json = self.request(method, path, params).await?;
        field(&mut json, "event_id")
    }

    // ==================== Droplets ====================

    /// List active droplets
    pub async fn droplets(&self) -> Result<Vec<Droplet>, ClientError> {
        let mut json = self.request(Method::Get, "/droplets", Params::new()).await?;
        list(&mut json, "droplets")
    }

    pub async fn droplet(&self, id: u64) -> Result<Droplet, ClientError> {
        let mut json = self
            .request(Method::Get, &format!("/droplets/{}", id), Params::new())
            .await?;
        field(&mut json, "droplet")
    }

    pub async fn create_droplet(&self, new: &NewDroplet) -> Result<Droplet, ClientError> {
        let mut params: Params = vec![
            ("name", new.name.clone()),
            ("size_id", new.size_id.to_string()),
            ("image_id", new.image_id.to_string()),
            ("region_id", new.region_id.to_string()),
        ];
        if !new.ssh_key_ids.is_empty() {
            let ids: Vec<String> = new.ssh_key_ids.iter().map(u64::to_string).collect();
            params.push(("ssh_key_ids", ids.join(",")));
        }
        if new.private_networking {
            params.push(("private_networking", "true".to_string()));
        }
        if new.backups_enabled {
            params.push(("backups_enabled", "true".to_string()));
        }

        let mut json = self.request(Method::Get, "/droplets/new", params).await?;
        field(&mut json, "droplet")
    }

    /// Run an argument-less droplet operation, returning its event id
    pub async fn droplet_action(&self, id: u64, action: DropletAction) -> Result<u64, ClientError> {
        self.event_id(
            action.method(),
            &format!("/droplets/{}/{}", id, action.as_path()),
            Params::new(),
        )
        .await
    }

    pub async fn resize_droplet(&self, id: u64, size_id: u64) -> Result<u64, ClientError> {
        self.event_id(
            Method::Post,
            &format!("/droplets/{}/resize", id),
            vec![("size_id", size_id.to_string())],
        )
        .await
    }

    pub async fn snapshot_droplet(&self, id: u64, name: Option<&str>) -> Result<u64, ClientError> {
        let params = name
            .map(|n| vec![("name", n.to_string())])
            .unwrap_or_default();
        self.event_id(Method::Post, &format!("/droplets/{}/snapshot", id), params)
            .await
    }

    pub async fn restore_droplet(&self, id: u64, image_id: u64) -> Result<u64, ClientError> {
        self.event_id(
            Method::Get,
            &format!("/droplets/{}/restore", id),
            vec![("image_id", image_id.to_string())],
        )
        .await
    }

    pub async fn rebuild_droplet(&self, id: u64, image_id: u64) -> Result<u64, ClientError> {
        self.event_id(
            Method::Post,
            &format!("/droplets/{}/rebuild", id),
            vec![("image_id", image_id.to_string())],
        )
        .await
    }

    pub async fn rename_droplet(&self, id: u64, name: &str) -> Result<u64, ClientError> {
        self.event_id(
            Method::Get,
            &format!("/droplets/{}/rename", id),
            vec![("name", name.to_string())],
        )
        .await
    }

    /// Destroy a droplet, optionally overwriting its disk first
    pub async fn destroy_droplet(&self, id: u64, scrub_data: bool) -> Result<u64, ClientError> {
        let params = if scrub_data {
            vec![("scrub_data", "true".to_string())]
        } else {
            Params::new()
        };
        self.event_id(Method::Post, &format!("/droplets/{}/destroy", id), params)
            .await
    }

    // ==================== Regions, sizes, images ====================

    pub async fn regions(&self) -> Result<Vec<Region>, ClientError> {
        let mut json = self.request(Method::Get, "/regions", Params::new()).await?;
        list(&mut json, "regions")
    }

    pub async fn sizes(&self) -> Result<Vec<Size>, ClientError> {
        let mut json = self.request(Method::Get, "/sizes", Params::new()).await?;
        list(&mut json, "sizes")
    }

    pub async fn images(&self, filter: ImageFilter) -> Result<Vec<Image>, ClientError> {
        let params = filter
            .as_param()
            .map(|f| vec![("filter", f.to_string())])
            .unwrap_or_default();
        let mut json = self.request(Method::Get, "/images", params).await?;
        list(&mut json, "images")
    }

    pub async fn image(&self, id: u64) -> Result<Image, ClientError> {
        let mut json = self
            .request(Method::Get, &format!("/images/{}", id), Params::new())
            .await?;
        field(&mut json, "image")
    }

    /// Destroy one of the account's images
    pub async fn destroy_image(&self, id: u64) -> Result<(), ClientError> {
        self.request(Method::Get, &format!("/images/{}/destroy", id), Params::new())
            .await?;
        Ok(())
    }

    /// Copy an image to another region, returning the event id
    pub async fn transfer_image(&self, id: u64, region_id: u64) -> Result<u64, ClientError> {
        self.event_id(
            Method::Get,
            &format!("/images/{}/transfer", id),
            vec![("region_id", region_id.to_string())],
        )
        .await
    }

    // ==================== SSH keys ====================

    pub async fn ssh_keys(&self) -> Result<Vec<SshKey>, ClientError> {
        let mut json = self.request(Method::Get, "/ssh_keys", Params::new()).await?;
        list(&mut json, "ssh_keys")
    }

    pub async fn ssh_key(&self, id: u64) -> Result<SshKey, ClientError> {
        let mut json = self
            .request(Method::Get, &format!("/ssh_keys/{}", id), Params::new())
            .await?;
        field(&mut json, "ssh_key")
    }

    pub async fn add_ssh_key(&self, name: &str, ssh_pub_key: &str) -> Result<SshKey, ClientError> {
        let mut json = self
            .request(
                Method::Get,
                "/ssh_keys/new",
                vec![("name", name.to_string()), ("ssh_pub_key", ssh_pub_key.to_string())],
            )
            .await?;
        field(&mut json, "ssh_key")
    }

    pub async fn edit_ssh_key(&self, id: u64, ssh_pub_key: &str) -> Result<SshKey, ClientError> {
        let mut json = self
            .request(
                Method::Get,
                &format!("/ssh_keys/{}/edit", id),
                vec![("ssh_pub_key", ssh_pub_key.to_string())],
            )
            .await?;
        field(&mut json, "ssh_key")
    }

    pub async fn destroy_ssh_key(&self, id: u64) -> Result<(), ClientError> {
        self.request(Method::Get, &format!("/ssh_keys/{}/destroy", id), Params::new())
            .await?;
        Ok(())
    }

    // ==================== Domains ====================

    pub async fn domains(&self) -> Result<Vec<Domain>, ClientError> {
        let mut json = self.request(Method::Get, "/domains", Params::new()).await?;
        list(&mut json, "domains")
    }

    /// Look up a domain by id or name
    pub async fn domain(&self, domain: &str) -> Result<Domain, ClientError> {
        let mut json = self
            .request(Method::Get, &format!("/domains/{}", domain), Params::new())
            .await?;
        field(&mut json, "domain")
    }

    /// Create a domain with an A record pointing at `ip_address`
    pub async fn create_domain(&self, name: &str, ip_address: &str) -> Result<Domain, ClientError> {
        let mut json = self
            .request(
                Method::Get,
                "/domains/new",
                vec![("name", name.to_string()), ("ip_address", ip_address.to_string())],
            )
            .await?;
        field(&mut json, "domain")
    }

    pub async fn destroy_domain(&self, domain: &str) -> Result<(), ClientError> {
        self.request(Method::Get, &format!("/domains/{}/destroy", domain), Params::new())
            .await?;
        Ok(())
    }

    // ==================== Records ====================

    pub async fn records(&self, domain: &str) -> Result<Vec<Record>, ClientError> {
        let mut json = self
            .request(Method::Get, &format!("/domains/{}/records", domain), Params::new())
            .await?;
        list(&mut json, "records")
    }

    pub async fn record(&self, domain: &str, id: u64) -> Result<Record, ClientError> {
        let mut json = self
            .request(
                Method::Get,
                &format!("/domains/{}/records/{}", domain, id),
                Params::new(),
            )
            .await?;
        field(&mut json, "record")
    }

    pub async fn create_record(&self, domain: &str, record: &RecordParams) -> Result<Record, ClientError> {
        let mut json = self
            .request(
                Method::Get,
                &format!("/domains/{}/records/new", domain),
                record_params(record),
            )
            .await?;
        field(&mut json, "record")
    }

    pub async fn edit_record(
        &self,
        domain: &str,
        id: u64,
        record: &RecordParams,
    ) -> Result<Record, ClientError> {
        let mut json = self
            .request(
                Method::Get,
                &format!("/domains/{}/records/{}/edit", domain, id),
                record_params(record),
            )
            .await?;
        field(&mut json, "record")
    }

    pub async fn destroy_record(&self, domain: &str, id: u64) -> Result<(), ClientError> {
        self.request(
            Method::Get,
            &format!("/domains/{}/records/{}/destroy", domain, id),
            Params::new(),
        )
        .await?;
        Ok(())
    }

    // ==================== Events ====================

    pub async fn event(&self, id: u64) -> Result<Event, ClientError> {
        let mut json = self
            .request(Method::Get, &format!("/events/{}", id), Params::new())
            .await?;
        field(&mut json, "event")
    }
}

fn record_params(record: &RecordParams) -> Params {
    let mut params: Params = vec![
        ("record_type", record.record_type.clone()),
        ("data", record.data.clone()),
    ];
    if let Some(name) = &record.name {
        params.push(("name", name.clone()));
    }
    if let Some(priority) = record.priority {
        params.push(("priority", priority.to_string()));
    }
    if let Some(port) = record.port {
        params.push(("port", port.to_string()));
    }
    if let Some(weight) = record.weight {
        params.push(("weight", weight.to_string()));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_paths_and_methods() {
        assert_eq!(DropletAction::PowerCycle.as_path(), "power_cycle");
        assert_eq!(DropletAction::Reboot.method(), Method::Post);
        assert_eq!(DropletAction::PowerOn.method(), Method::Get);
    }

    #[test]
    fn test_record_params_skip_unset_fields() {
        let params = record_params(&RecordParams {
            record_type: "A".to_string(),
            data: "10.0.0.1".to_string(),
            name: Some("www".to_string()),
            ..RecordParams::default()
        });

        assert_eq!(
            params,
            vec![
                ("record_type", "A".to_string()),
                ("data", "10.0.0.1".to_string()),
                ("name", "www".to_string()),
            ]
        );
    }
}
