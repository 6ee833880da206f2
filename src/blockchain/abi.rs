//! Bindings for the deployed election contract.
//!
//! The ABI is fixed by the deployment; the generated `ElectionVoting<M>` type,
//! the `*Filter` event structs and `ElectionVotingEvents` come from `abigen!`.

use ethers::contract::abigen;

abigen!(
    ElectionVoting,
    r#"[
        event CandidateAdded(uint256 indexed electionId, uint256 indexed candidateId, string name)
        event ElectionCreated(uint256 indexed electionId, address indexed creator, uint256 startTime, uint256 endTime, string title, string description)
        event ElectionFinalized(uint256 indexed electionId, uint256 timestamp)
        event VoteCast(uint256 indexed electionId, address indexed voter, uint256 indexed candidateId, uint256 timestamp)
        event VoterRegistered(address indexed voter, uint256 timestamp)
        function admin() external view returns (address)
        function addCandidate(uint256 _electionId, string _name) external
        function candidateCount(uint256) external view returns (uint256)
        function createElection(string _title, string _description, uint256 _durationMinutes, uint256 _startDelayMinutes) external returns (uint256)
        function elections(uint256) external view returns (uint256 startTime, uint256 endTime, bool finalized, bool exists, address creator)
        function finalizeElection(uint256 _electionId) external
        function getCandidateCount(uint256 _electionId) external view returns (uint256)
        function getElectionCreator(uint256 _electionId) external view returns (address)
        function getElectionStatus(uint256 _electionId) external view returns (string)
        function getTotalElections() external view returns (uint256)
        function hasVoted(uint256, address) external view returns (bool)
        function hasVoterVoted(uint256 _electionId, address _voter) external view returns (bool)
        function isRegistered(address) external view returns (bool)
        function registerVoter(address _voter) external
        function transferAdmin(address _newAdmin) external
        function validCandidate(uint256, uint256) external view returns (bool)
        function vote(uint256 _electionId, uint256 _candidateId) external
    ]"#
);
