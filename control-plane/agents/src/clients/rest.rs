use super::{ControllerApi, ReplicaApi, ReplicaClientFactory};
use crate::errors::{
    ControllerRequest, HttpRequest, InvalidControllerUrl, InvalidReplicaAddress, ReplicaRequest,
    SvcError,
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use snafu::ResultExt;
use std::{sync::Arc, time::Duration};
use stor_port::types::v0::transport::{
    BackupLocation, CreateSnapshot, Replica, ReplicaAddress, ReplicaCreateBackup, ReplicaInfo,
    ReplicaMode, SnapshotChain, SnapshotName, Volume, VolumeId,
};
use url::Url;

/// A list of resources as returned by the controller.
#[derive(Deserialize, Debug)]
struct Collection<T> {
    data: Vec<T>,
}

#[derive(Deserialize, Debug)]
struct VolumeResource {
    name: String,
}

#[derive(Deserialize, Debug)]
struct ReplicaResource {
    address: ReplicaAddress,
    mode: ReplicaMode,
}

#[derive(Deserialize, Debug)]
struct SnapshotOutput {
    id: SnapshotName,
}

#[derive(Deserialize, Debug)]
struct ReplicaInfoResource {
    #[serde(default)]
    chain: SnapshotChain,
    #[serde(default)]
    rebuilding: bool,
}

#[derive(Deserialize, Debug)]
struct BackupOutput {
    location: BackupLocation,
}

#[derive(Serialize, Debug)]
struct BackupLocationInput<'a> {
    location: &'a BackupLocation,
}

/// Send the request, failing only when no response was received.
async fn send(request: RequestBuilder, url: &Url) -> Result<Response, SvcError> {
    request.send().await.context(HttpRequest { url: url.as_str() })
}

/// Decode a json response body.
async fn json<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, SvcError> {
    response.json::<T>().await.context(HttpRequest { url: url.as_str() })
}

/// The status and body of an unsuccessful response.
async fn failure(response: Response) -> (u16, String) {
    let status = response.status();
    let reason = match response.text().await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("unknown reason")
            .to_string(),
    };
    (status.as_u16(), reason)
}

/// REST client for the volume's controller.
#[derive(Debug, Clone)]
pub struct ControllerRestClient {
    base: Url,
    volume: VolumeId,
    http: reqwest::Client,
    timeout: Duration,
}

impl ControllerRestClient {
    /// Create a new client for the controller at `endpoint`, managing `volume`.
    pub fn new(endpoint: &str, volume: VolumeId, timeout: Duration) -> Result<Self, SvcError> {
        let mut base = Url::parse(endpoint).context(InvalidControllerUrl { url: endpoint })?;
        // resource paths are joined onto the endpoint's path, not its parent
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            base,
            volume,
            http: reqwest::Client::new(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> Result<Url, SvcError> {
        self.base.join(path).context(InvalidControllerUrl {
            url: format!("{}{path}", self.base),
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        name: &str,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, SvcError> {
        let response = send(request.timeout(self.timeout), url).await?;
        if !response.status().is_success() {
            let (status, reason) = failure(response).await;
            return ControllerRequest {
                request: name,
                status,
                reason,
            }
            .fail();
        }
        json(response, url).await
    }
}

#[async_trait]
impl ControllerApi for ControllerRestClient {
    async fn get_volume(&self) -> Result<Volume, SvcError> {
        let url = self.url(&format!("v1/volumes/{}", self.volume))?;
        let response = send(self.http.get(url.clone()).timeout(self.timeout), &url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SvcError::VolumeNotFound {
                volume: self.volume.clone(),
            });
        }
        if !response.status().is_success() {
            let (status, reason) = failure(response).await;
            return ControllerRequest {
                request: "get_volume",
                status,
                reason,
            }
            .fail();
        }
        let volume = json::<VolumeResource>(response, &url).await?;
        Ok(Volume::new(volume.name))
    }

    async fn list_replicas(&self) -> Result<Vec<Replica>, SvcError> {
        let url = self.url("v1/replicas")?;
        let replicas: Collection<ReplicaResource> = self
            .request("list_replicas", self.http.get(url.clone()), &url)
            .await?;
        Ok(replicas
            .data
            .into_iter()
            .map(|replica| Replica::new(replica.address, replica.mode))
            .collect())
    }

    async fn create_snapshot(&self, request: &CreateSnapshot) -> Result<SnapshotName, SvcError> {
        let mut url = self.url(&format!("v1/volumes/{}", self.volume))?;
        url.set_query(Some("action=snapshot"));
        let output: SnapshotOutput = self
            .request(
                "create_snapshot",
                self.http.post(url.clone()).json(request),
                &url,
            )
            .await?;
        Ok(output.id)
    }
}

/// The REST endpoint of the replica at the given address.
/// Addresses are given as `tcp://host:port`, where the port is the replica's REST port.
pub fn replica_url(address: &ReplicaAddress) -> Result<Url, SvcError> {
    let host = address
        .as_str()
        .strip_prefix("tcp://")
        .unwrap_or_else(|| address.as_str());
    Url::parse(&format!("http://{host}/"))
        .and_then(|url| url.join(utils::REPLICA_RESOURCE_PATH))
        .context(InvalidReplicaAddress {
            replica: address.clone(),
        })
}

/// REST client for a single replica.
#[derive(Debug, Clone)]
pub struct ReplicaRestClient {
    address: ReplicaAddress,
    base: Url,
    http: reqwest::Client,
    timeout: Duration,
}

impl ReplicaRestClient {
    /// Create a new client for the replica at `address`.
    /// Short requests are bounded by `timeout`; backup and restore run until the replica answers.
    pub fn new(
        address: &ReplicaAddress,
        http: reqwest::Client,
        timeout: Duration,
    ) -> Result<Self, SvcError> {
        Ok(Self {
            address: address.clone(),
            base: replica_url(address)?,
            http,
            timeout,
        })
    }

    fn action_url(&self, action: &str) -> Url {
        let mut url = self.base.clone();
        url.set_query(Some(&format!("action={action}")));
        url
    }

    async fn request(
        &self,
        name: &str,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<Response, SvcError> {
        let response = send(request, url).await?;
        if !response.status().is_success() {
            let (status, reason) = failure(response).await;
            return ReplicaRequest {
                replica: self.address.clone(),
                request: name,
                status,
                reason,
            }
            .fail();
        }
        Ok(response)
    }
}

#[async_trait]
impl ReplicaApi for ReplicaRestClient {
    async fn replica_info(&self) -> Result<ReplicaInfo, SvcError> {
        let url = self.base.clone();
        let request = self.http.get(url.clone()).timeout(self.timeout);
        let response = self.request("replica_info", request, &url).await?;
        let info = json::<ReplicaInfoResource>(response, &url).await?;
        Ok(ReplicaInfo {
            chain: info.chain,
            rebuilding: info.rebuilding,
        })
    }

    async fn create_backup(
        &self,
        request: &ReplicaCreateBackup,
    ) -> Result<BackupLocation, SvcError> {
        let url = self.action_url("backup");
        let response = self
            .request("backup", self.http.post(url.clone()).json(request), &url)
            .await?;
        let output = json::<BackupOutput>(response, &url).await?;
        Ok(output.location)
    }

    async fn remove_backup(&self, location: &BackupLocation) -> Result<(), SvcError> {
        let url = self.action_url("rmbackup");
        let request = self
            .http
            .post(url.clone())
            .json(&BackupLocationInput { location })
            .timeout(self.timeout);
        self.request("rmbackup", request, &url).await?;
        Ok(())
    }

    async fn restore_backup(&self, location: &BackupLocation) -> Result<(), SvcError> {
        let url = self.action_url("restore");
        let request = self
            .http
            .post(url.clone())
            .json(&BackupLocationInput { location });
        self.request("restore", request, &url).await?;
        Ok(())
    }
}

/// Builds REST clients for replicas, sharing a single connection pool.
#[derive(Debug, Clone)]
pub struct ReplicaRestFactory {
    http: reqwest::Client,
    timeout: Duration,
}

impl ReplicaRestFactory {
    /// Create a new factory whose clients bound short requests by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }
}

impl ReplicaClientFactory for ReplicaRestFactory {
    fn client(&self, address: &ReplicaAddress) -> Result<Arc<dyn ReplicaApi>, SvcError> {
        let client = ReplicaRestClient::new(address, self.http.clone(), self.timeout)?;
        Ok(Arc::new(client))
    }
}
